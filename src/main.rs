use anyhow::Result;
use file_store::{FileServer, StorageService, config::AppConfig, storage::LocalFsBackend};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env_and_args()?;
    tracing::info!("Starting file-store with config: {:?}", cfg);

    // --- Storage root is created here if missing ---
    let backend = LocalFsBackend::new(&cfg.storage_dir)?;
    let storage = StorageService::new(backend);

    let mut server = FileServer::new(cfg.addr(), storage);
    server.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    server.stop().await?;

    Ok(())
}
