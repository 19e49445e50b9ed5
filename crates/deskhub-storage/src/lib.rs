//! Credential storage for the deskhub client.
//!
//! Two layers:
//! - [`SecureStorage`] backends: [`FileStorage`] (durable, `~/.deskhub/credentials.json`)
//!   and [`MemoryStorage`] (ephemeral).
//! - [`CredentialStore`], the fault-absorbing facade the rest of the client
//!   uses. Its operations never fail: hangs and backend errors degrade to
//!   "no credential".

mod credential;
mod file;
mod keys;
mod memory;
mod traits;

pub use credential::{Credential, CredentialStore};
pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use traits::SecureStorage;

use deskhub_config::Paths;
use std::sync::Arc;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific failure
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Store file is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Operation did not complete within its bound
    #[error("Storage operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Create the default durable storage rooted at `paths`.
pub fn create_storage(paths: &Paths) -> Arc<dyn SecureStorage> {
    Arc::new(FileStorage::new(paths.credentials_file()))
}
