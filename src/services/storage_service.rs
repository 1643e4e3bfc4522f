//! src/services/storage_service.rs
//!
//! StorageService maps upload, download, metadata and delete onto artifacts in
//! a [`StorageBackend`]. A stored file with id `{id}` is made of three artifacts:
//!
//! - `{id}`: the raw content; its presence alone decides whether the file exists
//! - `{id}.metadata`: the caller-supplied metadata string
//! - `{id}.filename`: the filename given at upload
//!
//! Sidecars may be missing (files written by older deployments, or content that
//! outlived a partial failure) and then read back as empty strings.

use crate::{
    models::stored_file::{DownloadedFile, FileInfo, UploadedFile},
    storage::{StorageBackend, StorageError, StorageResult},
};
use bytes::Bytes;
use std::{future::Future, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

pub const METADATA_SUFFIX: &str = ".metadata";
pub const FILENAME_SUFFIX: &str = ".filename";

pub fn metadata_key(id: &str) -> String {
    format!("{}{}", id, METADATA_SUFFIX)
}

pub fn filename_key(id: &str) -> String {
    format!("{}{}", id, FILENAME_SUFFIX)
}

/// Stateless request handler over a shared backend.
///
/// Operations on the same id are not coordinated with each other: a delete
/// racing a download may make the download fail part-way.
pub struct StorageService<B> {
    backend: Arc<B>,
}

impl<B> Clone for StorageService<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: StorageBackend> StorageService<B> {
    pub fn new(backend: B) -> Self {
        Self::from_shared(Arc::new(backend))
    }

    pub fn from_shared(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Store a new file and return its generated id.
    ///
    /// Sidecars are written before the content, so the file only becomes
    /// visible once everything is in place. If any write fails or the call is
    /// cancelled, the artifacts already written are removed.
    pub async fn upload(
        &self,
        filename: &str,
        content: Bytes,
        metadata: &str,
        cancel: &CancellationToken,
    ) -> StorageResult<UploadedFile> {
        let id = Uuid::new_v4().to_string();

        if let Err(err) = self
            .write_artifacts(&id, filename, content, metadata, cancel)
            .await
        {
            self.discard(&id).await;
            return Err(err);
        }

        info!("File uploaded: {} -> {}", filename, id);
        Ok(UploadedFile { id })
    }

    async fn write_artifacts(
        &self,
        id: &str,
        filename: &str,
        content: Bytes,
        metadata: &str,
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        let metadata = Bytes::copy_from_slice(metadata.as_bytes());
        let filename = Bytes::copy_from_slice(filename.as_bytes());

        step(cancel, self.backend.put(&metadata_key(id), metadata)).await?;
        step(cancel, self.backend.put(&filename_key(id), filename)).await?;
        step(cancel, self.backend.put(id, content)).await
    }

    /// Best-effort removal of whatever an aborted upload left behind.
    ///
    /// Not airtight: a cancelled content rename may still land on the blocking
    /// pool after this runs, leaving content under an id nobody was given.
    async fn discard(&self, id: &str) {
        for key in [id.to_string(), metadata_key(id), filename_key(id)] {
            match self.backend.delete(&key).await {
                Ok(()) => debug!("discarded artifact {} of aborted upload", key),
                Err(StorageError::NotFound(_)) => {}
                Err(err) => debug!("failed to discard artifact {}: {}", key, err),
            }
        }
    }

    /// Read back content, metadata and filename of a stored file.
    pub async fn download(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> StorageResult<DownloadedFile> {
        self.ensure_exists(id, cancel).await?;

        let metadata = self.read_sidecar(&metadata_key(id), cancel).await?;
        let filename = self.recovered_name(id, cancel).await?;
        let content = step(cancel, self.backend.get(id)).await?;

        Ok(DownloadedFile {
            filename,
            content,
            metadata,
        })
    }

    /// Describe a stored file without reading its content.
    pub async fn get_metadata(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> StorageResult<FileInfo> {
        self.ensure_exists(id, cancel).await?;

        let metadata = self.read_sidecar(&metadata_key(id), cancel).await?;
        let filename = self.recovered_name(id, cancel).await?;
        let stat = step(cancel, self.backend.stat(id)).await?;

        Ok(FileInfo {
            filename,
            metadata,
            size_bytes: stat.size_bytes,
            created_at: stat.created_at,
        })
    }

    /// Remove a stored file. Sidecars that are already gone are not an error.
    pub async fn delete(&self, id: &str, cancel: &CancellationToken) -> StorageResult<()> {
        self.ensure_exists(id, cancel).await?;

        step(cancel, self.backend.delete(id)).await?;
        for key in [metadata_key(id), filename_key(id)] {
            match step(cancel, self.backend.delete(&key)).await {
                Ok(()) | Err(StorageError::NotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }

        info!("File deleted: {}", id);
        Ok(())
    }

    /// Only ids this service could have generated are looked up; anything else
    /// is reported missing without touching the backend.
    async fn ensure_exists(&self, id: &str, cancel: &CancellationToken) -> StorageResult<()> {
        if Uuid::parse_str(id).is_err() {
            return Err(StorageError::NotFound(id.to_string()));
        }
        if !step(cancel, self.backend.exists(id)).await? {
            return Err(StorageError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn read_sidecar(&self, key: &str, cancel: &CancellationToken) -> StorageResult<String> {
        match step(cancel, self.backend.get(key)).await {
            Ok(data) => Ok(String::from_utf8_lossy(&data).into_owned()),
            Err(StorageError::NotFound(_)) => Ok(String::new()),
            Err(err) => Err(err),
        }
    }

    async fn recovered_name(&self, id: &str, cancel: &CancellationToken) -> StorageResult<String> {
        let filename = self.read_sidecar(&filename_key(id), cancel).await?;
        if filename.is_empty() {
            Ok(id.to_string())
        } else {
            Ok(filename)
        }
    }
}

/// Run one backend action, abandoning it as soon as `cancel` fires.
async fn step<T>(
    cancel: &CancellationToken,
    action: impl Future<Output = StorageResult<T>>,
) -> StorageResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StorageError::Cancelled),
        result = action => result,
    }
}
