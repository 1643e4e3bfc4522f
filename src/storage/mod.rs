//! Persistence seam for stored files.
//!
//! Every byte the service keeps goes through [`StorageBackend`]. A backend
//! knows nothing about ids or sidecars; it only stores whole artifacts under
//! flat string keys. The Storage Handler decides which keys make up a file.

use crate::models::stored_file::ArtifactStat;
use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use thiserror::Error;

pub mod local_fs;
pub mod memory;

pub use local_fs::LocalFsBackend;
pub use memory::MemoryBackend;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("`{0}` not found")]
    NotFound(String),
    #[error("artifact key `{0}` is invalid")]
    InvalidKey(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Whole-artifact key/value storage.
///
/// Implementations must be safe to call from many calls at once; no
/// coordination is expected between operations on the same key.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Persist `data` under `key`, replacing anything already there.
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()>;

    /// Read the artifact under `key`. Missing artifacts yield `NotFound`.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Remove the artifact under `key`. Missing artifacts yield `NotFound`.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Size and creation time of the artifact under `key`.
    async fn stat(&self, key: &str) -> StorageResult<ArtifactStat>;
}
