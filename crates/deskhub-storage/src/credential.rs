//! The single bearer credential and its fault-absorbing store.

use crate::{SecureStorage, StorageError, StorageKeys, StorageResult};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Opaque bearer token.
///
/// `Debug` and `Display` never print the token itself.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// A usable token is non-empty printable ASCII without whitespace.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_graphic())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential([REDACTED; {} bytes])", self.0.len())
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Persists at most one credential under [`StorageKeys::AUTH_TOKEN`].
///
/// None of the operations fail. Each backend call is bounded by the operation
/// timeout; a hang or a backend error is logged and treated as "no credential"
/// (for reads) or as a no-op (for writes).
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn SecureStorage>,
    op_timeout: Duration,
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("op_timeout", &self.op_timeout)
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn SecureStorage>, op_timeout: Duration) -> Self {
        Self {
            storage,
            op_timeout,
        }
    }

    /// Load the stored credential.
    ///
    /// A stored value that is not a well-formed token is considered corrupted:
    /// it is deleted and `None` is returned.
    pub async fn get(&self) -> Option<Credential> {
        let raw = match self.bounded(self.storage.get(StorageKeys::AUTH_TOKEN)).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "Credential read failed, treating as absent");
                if matches!(e, StorageError::Json(_) | StorageError::Encoding(_)) {
                    self.clear().await;
                }
                return None;
            }
        };

        let credential = Credential::new(raw);
        if !credential.is_well_formed() {
            warn!("Stored credential is malformed, discarding it");
            self.clear().await;
            return None;
        }

        Some(credential)
    }

    /// Persist `credential`, replacing any previous one.
    ///
    /// Returns whether the credential was written. Malformed tokens are
    /// rejected without touching storage.
    pub async fn set(&self, credential: &Credential) -> bool {
        if !credential.is_well_formed() {
            warn!("Refusing to persist a malformed credential");
            return false;
        }

        match self
            .bounded(
                self.storage
                    .set(StorageKeys::AUTH_TOKEN, credential.expose()),
            )
            .await
        {
            Ok(()) => {
                debug!("Credential stored");
                true
            }
            Err(e) => {
                warn!(error = %e, "Credential write failed");
                false
            }
        }
    }

    /// Remove the stored credential. Idempotent.
    pub async fn clear(&self) {
        match self.bounded(self.storage.delete(StorageKeys::AUTH_TOKEN)).await {
            Ok(removed) => debug!(removed, "Credential cleared"),
            Err(e) => warn!(error = %e, "Credential delete failed"),
        }
    }

    async fn bounded<T>(&self, op: impl Future<Output = StorageResult<T>>) -> StorageResult<T> {
        match tokio::time::timeout(self.op_timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout(self.op_timeout)),
        }
    }
}
