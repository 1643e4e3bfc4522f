//! Directory-backed artifact storage.
//!
//! Each artifact is a regular file directly beneath `root`, named by its key.
//! Writes go to a `.tmp-{uuid}` file in the same directory and are renamed
//! into place once flushed, so readers never observe a half-written artifact.

use super::{StorageBackend, StorageError, StorageResult};
use crate::models::stored_file::ArtifactStat;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

const MAX_KEY_LEN: usize = 255;
const TMP_PREFIX: &str = ".tmp-";

#[derive(Clone, Debug)]
pub struct LocalFsBackend {
    root: PathBuf,
}

impl LocalFsBackend {
    /// Open a backend rooted at `root`, creating the directory if it is missing.
    pub fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        if !root.exists() {
            std::fs::create_dir_all(&root)?;
            tracing::info!("Created storage directory at {}", root.display());
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reject keys that could escape `root` or collide with temp files.
    fn ensure_key_safe(key: &str) -> StorageResult<()> {
        let invalid = key.is_empty()
            || key.len() > MAX_KEY_LEN
            || key == "."
            || key.contains("..")
            || key.starts_with(TMP_PREFIX)
            || key
                .bytes()
                .any(|b| b.is_ascii_control() || b == b'/' || b == b'\\');
        if invalid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(())
    }

    fn artifact_path(&self, key: &str) -> StorageResult<PathBuf> {
        Self::ensure_key_safe(key)?;
        Ok(self.root.join(key))
    }

    async fn write_tmp(tmp_path: &Path, data: &[u8]) -> io::Result<()> {
        let mut file = File::create(tmp_path).await?;
        file.write_all(data).await?;
        file.flush().await?;
        file.sync_all().await
    }
}

fn not_found_as(key: &str) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |err| {
        if err.kind() == ErrorKind::NotFound {
            StorageError::NotFound(key.to_string())
        } else {
            StorageError::Io(err)
        }
    }
}

#[async_trait]
impl StorageBackend for LocalFsBackend {
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        let path = self.artifact_path(key)?;
        let tmp_path = self.root.join(format!("{}{}", TMP_PREFIX, Uuid::new_v4()));

        if let Err(err) = Self::write_tmp(&tmp_path, &data).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }
        if let Err(err) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }

        debug!("wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let path = self.artifact_path(key)?;
        let data = fs::read(&path).await.map_err(not_found_as(key))?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.artifact_path(key)?;
        fs::remove_file(&path).await.map_err(not_found_as(key))?;
        debug!("removed {}", path.display());
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.artifact_path(key)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    async fn stat(&self, key: &str) -> StorageResult<ArtifactStat> {
        let path = self.artifact_path(key)?;
        let meta = fs::metadata(&path).await.map_err(not_found_as(key))?;
        // Not every filesystem records a birth time.
        let created = match meta.created() {
            Ok(created) => created,
            Err(_) => meta.modified()?,
        };
        Ok(ArtifactStat {
            size_bytes: meta.len(),
            created_at: DateTime::<Utc>::from(created),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn backend() -> (TempDir, LocalFsBackend) {
        let temp = TempDir::new().unwrap();
        let backend = LocalFsBackend::new(temp.path().join("files")).unwrap();
        (temp, backend)
    }

    #[test]
    fn new_creates_missing_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("nested").join("root");
        assert!(!root.exists());

        LocalFsBackend::new(&root).unwrap();
        assert!(root.is_dir());
    }

    #[tokio::test]
    async fn put_writes_raw_file_named_by_key() {
        let (_temp, backend) = backend();

        backend.put("abc", Bytes::from_static(b"payload")).await.unwrap();

        let on_disk = std::fs::read(backend.root().join("abc")).unwrap();
        assert_eq!(on_disk, b"payload");
    }

    #[tokio::test]
    async fn put_leaves_no_temp_files_behind() {
        let (_temp, backend) = backend();

        backend.put("one", Bytes::from_static(b"1")).await.unwrap();
        backend.put("two", Bytes::from_static(b"2")).await.unwrap();

        let mut names: Vec<String> = std::fs::read_dir(backend.root())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn put_replaces_existing_artifact() {
        let (_temp, backend) = backend();

        backend.put("k", Bytes::from_static(b"old")).await.unwrap();
        backend.put("k", Bytes::from_static(b"new")).await.unwrap();

        assert_eq!(backend.get("k").await.unwrap(), Bytes::from_static(b"new"));
    }

    #[tokio::test]
    async fn missing_artifacts_report_not_found() {
        let (_temp, backend) = backend();

        assert!(!backend.exists("ghost").await.unwrap());
        assert!(matches!(
            backend.get("ghost").await,
            Err(StorageError::NotFound(key)) if key == "ghost"
        ));
        assert!(matches!(
            backend.delete("ghost").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            backend.stat("ghost").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_file() {
        let (_temp, backend) = backend();

        backend.put("gone", Bytes::from_static(b"x")).await.unwrap();
        assert!(backend.exists("gone").await.unwrap());

        backend.delete("gone").await.unwrap();
        assert!(!backend.exists("gone").await.unwrap());
        assert!(!backend.root().join("gone").exists());
    }

    #[tokio::test]
    async fn stat_reports_size_and_recent_creation_time() {
        let (_temp, backend) = backend();
        let before = Utc::now() - chrono::Duration::seconds(2);

        backend.put("sized", Bytes::from_static(b"12345")).await.unwrap();
        let stat = backend.stat("sized").await.unwrap();

        assert_eq!(stat.size_bytes, 5);
        assert!(stat.created_at >= before);
    }

    #[tokio::test]
    async fn directories_are_not_artifacts() {
        let (_temp, backend) = backend();
        std::fs::create_dir(backend.root().join("subdir")).unwrap();

        assert!(!backend.exists("subdir").await.unwrap());
    }

    #[tokio::test]
    async fn unsafe_keys_are_rejected() {
        let (_temp, backend) = backend();

        for key in ["", ".", "../escape", "a/b", "a\\b", "nul\0byte", ".tmp-123"] {
            assert!(
                matches!(
                    backend.put(key, Bytes::from_static(b"x")).await,
                    Err(StorageError::InvalidKey(_))
                ),
                "key {key:?} should be rejected"
            );
        }
        assert!(matches!(
            backend.exists("../etc/passwd").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
