//! Storage trait definitions.

use crate::StorageResult;
use async_trait::async_trait;

/// Durable key-value backend for secrets.
#[async_trait]
pub trait SecureStorage: Send + Sync {
    /// Store a value, overwriting any previous one
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Retrieve a value
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Delete a value. Returns whether something was removed.
    async fn delete(&self, key: &str) -> StorageResult<bool>;

    /// Check if a key exists
    async fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
