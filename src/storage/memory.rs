//! In-process backend, used where a real directory would only get in the way.

use super::{StorageBackend, StorageError, StorageResult};
use crate::models::stored_file::ArtifactStat;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryBackend {
    artifacts: RwLock<HashMap<String, (Bytes, DateTime<Utc>)>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of artifacts currently held, sidecars included.
    pub async fn len(&self) -> usize {
        self.artifacts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.artifacts.read().await.is_empty()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        self.artifacts
            .write()
            .await
            .insert(key.to_string(), (data, Utc::now()));
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.artifacts
            .read()
            .await
            .get(key)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.artifacts
            .write()
            .await
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.artifacts.read().await.contains_key(key))
    }

    async fn stat(&self, key: &str) -> StorageResult<ArtifactStat> {
        self.artifacts
            .read()
            .await
            .get(key)
            .map(|(data, created_at)| ArtifactStat {
                size_bytes: data.len() as u64,
                created_at: *created_at,
            })
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}
