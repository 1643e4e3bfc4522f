//! Service front-end: owns the listener and the tonic server task.
//!
//! ## Lifecycle
//! - [`FileServer::start`] binds the configured address and starts serving
//! - [`FileServer::port`] reports the bound port, useful when configured with port 0
//! - [`FileServer::stop`] stops accepting calls and waits for in-flight ones
//! - [`FileServer::cancel_all_calls`] aborts every in-flight call immediately

use crate::{
    handlers::FileRpc, pb::file_service_server::FileServiceServer,
    services::storage_service::StorageService, storage::StorageBackend,
};
use anyhow::{Context, Result, bail};
use std::{io::ErrorKind, net::SocketAddr};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tonic::transport::{Server, server::TcpIncoming};
use tracing::{info, warn};

mod calls;

pub use calls::CallTracker;

type ServeTask = JoinHandle<Result<(), tonic::transport::Error>>;

pub struct FileServer<B> {
    addr: String,
    storage: StorageService<B>,
    calls: CallTracker,
    shutdown: CancellationToken,
    local_addr: Option<SocketAddr>,
    task: Option<ServeTask>,
}

impl<B: StorageBackend> FileServer<B> {
    /// `addr` is `host:port`; port 0 binds any free port.
    pub fn new(addr: impl Into<String>, storage: StorageService<B>) -> Self {
        Self {
            addr: addr.into(),
            storage,
            calls: CallTracker::new(),
            shutdown: CancellationToken::new(),
            local_addr: None,
            task: None,
        }
    }

    /// Bind the listener and start serving calls in the background.
    pub async fn start(&mut self) -> Result<()> {
        if self.task.is_some() {
            bail!("server is already running");
        }

        info!("Starting gRPC server on {}", self.addr);

        let listener = bind(&self.addr).await?;
        let local_addr = listener.local_addr()?;
        let incoming = TcpIncoming::from_listener(listener, true, None)
            .map_err(|err| anyhow::anyhow!("configuring listener on {}: {}", local_addr, err))?;

        let rpc = FileRpc::new(self.storage.clone(), self.calls.clone());
        let shutdown = self.shutdown.clone();
        let task = tokio::spawn(
            Server::builder()
                .add_service(FileServiceServer::new(rpc))
                .serve_with_incoming_shutdown(incoming, async move {
                    shutdown.cancelled().await;
                }),
        );

        self.local_addr = Some(local_addr);
        self.task = Some(task);
        info!("gRPC server started on port {}", local_addr.port());
        Ok(())
    }

    /// Port the listener is bound to, once started.
    pub fn port(&self) -> Option<u16> {
        self.local_addr.map(|addr| addr.port())
    }

    /// Stop accepting calls, let in-flight calls finish, then release the listener.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };

        info!("Stopping gRPC server");
        self.shutdown.cancel();
        task.await
            .context("gRPC server task panicked")?
            .context("gRPC server failed")?;
        self.shutdown = CancellationToken::new();
        self.local_addr = None;
        info!("gRPC server stopped");
        Ok(())
    }

    /// Abort every call currently in flight. Work already done by those calls
    /// is not rolled back; the server keeps accepting new calls.
    pub fn cancel_all_calls(&self) {
        info!("Cancelling all in-flight calls");
        self.calls.cancel_all();
    }
}

/// Bind `addr`, falling back to loopback when a wildcard bind is refused.
async fn bind(addr: &str) -> Result<TcpListener> {
    match (TcpListener::bind(addr).await, wildcard_port(addr)) {
        (Ok(listener), _) => Ok(listener),
        (Err(err), Some(port)) if err.kind() == ErrorKind::PermissionDenied => {
            let fallback_addr = format!("127.0.0.1:{}", port);
            warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr, err, fallback_addr
            );
            TcpListener::bind(&fallback_addr)
                .await
                .with_context(|| format!("binding {}", fallback_addr))
        }
        (Err(err), _) => Err(err).with_context(|| format!("binding {}", addr)),
    }
}

/// Port of a `host:port` address whose host is a wildcard.
fn wildcard_port(addr: &str) -> Option<&str> {
    match addr.rsplit_once(':') {
        Some(("0.0.0.0" | "::", port)) => Some(port),
        _ => None,
    }
}
