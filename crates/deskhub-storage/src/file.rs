//! File-backed storage.
//!
//! All keys live in one JSON object. Writes go to a sibling temp file which is
//! then renamed over the original, so a crash mid-write leaves the previous
//! contents in place. On unix the file is created with mode `0600`.

use crate::{SecureStorage, StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

type Entries = BTreeMap<String, String>;

/// Durable storage in a single JSON file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> StorageResult<Entries> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Entries::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_entries(&self, entries: &Entries) -> StorageResult<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| StorageError::Backend(format!("no parent directory for {:?}", self.path)))?;
        tokio::fs::create_dir_all(parent).await?;

        let content = serde_json::to_vec_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");

        write_private(&tmp_path, &content).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!(path = ?self.path, entries = entries.len(), "Credential file written");
        Ok(())
    }
}

#[cfg(unix)]
async fn write_private(path: &Path, content: &[u8]) -> StorageResult<()> {
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .await?;
    file.write_all(content).await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(not(unix))]
async fn write_private(path: &Path, content: &[u8]) -> StorageResult<()> {
    tokio::fs::write(path, content).await?;
    Ok(())
}

#[async_trait]
impl SecureStorage for FileStorage {
    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        // An unreadable file is replaced rather than blocking every future write.
        let mut entries = self.read_entries().await.unwrap_or_default();
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries).await
    }

    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self.read_entries().await?;
        Ok(entries.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut entries = match self.read_entries().await {
            Ok(entries) => entries,
            Err(StorageError::Json(_)) => {
                // Corrupted file: drop it entirely.
                tokio::fs::remove_file(&self.path).await?;
                return Ok(true);
            }
            Err(e) => return Err(e),
        };

        if entries.remove(key).is_none() {
            return Ok(false);
        }
        self.write_entries(&entries).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_storage_persists_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/credentials.json");

        let storage = FileStorage::new(&path);
        storage.set("auth_token", "abc123").await.unwrap();
        storage.set("other", "value").await.unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(
            reopened.get("auth_token").await.unwrap(),
            Some("abc123".to_string())
        );
        assert!(reopened.has("other").await.unwrap());
    }

    #[tokio::test]
    async fn test_file_storage_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("credentials.json"));

        assert_eq!(storage.get("auth_token").await.unwrap(), None);
        assert!(!storage.delete("auth_token").await.unwrap());
    }

    #[tokio::test]
    async fn test_file_storage_delete() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("credentials.json"));

        storage.set("auth_token", "abc").await.unwrap();
        storage.set("keep", "me").await.unwrap();

        assert!(storage.delete("auth_token").await.unwrap());
        assert!(!storage.delete("auth_token").await.unwrap());
        assert_eq!(storage.get("keep").await.unwrap(), Some("me".to_string()));
    }

    #[tokio::test]
    async fn test_file_storage_corrupted_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, b"{not json").unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(
            storage.get("auth_token").await,
            Err(StorageError::Json(_))
        ));

        // Writing over a corrupted file recovers it.
        storage.set("auth_token", "fresh").await.unwrap();
        assert_eq!(
            storage.get("auth_token").await.unwrap(),
            Some("fresh".to_string())
        );
    }

    #[tokio::test]
    async fn test_file_storage_delete_removes_corrupted_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, b"garbage").unwrap();

        let storage = FileStorage::new(&path);
        assert!(storage.delete("auth_token").await.unwrap());
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_storage_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let storage = FileStorage::new(&path);
        storage.set("auth_token", "abc").await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
