//! Scriptable fakes for the backend and the storage layer.

use crate::AuthBackend;
use async_trait::async_trait;
use deskhub_api::{ApiError, ApiResult, LoginRequest, LoginResponse, UserProfile};
use deskhub_storage::{
    Credential, CredentialStore, MemoryStorage, SecureStorage, StorageError, StorageKeys, StorageResult,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn user(id: u64, email: &str) -> UserProfile {
    serde_json::from_value(serde_json::json!({ "id": id, "email": email })).unwrap()
}

/// How a scripted call behaves.
#[derive(Clone)]
pub enum Script<T> {
    Respond(T),
    Delayed(Duration, T),
    Fail(ApiError),
    Hang,
    Panic,
}

impl<T: Clone> Script<T> {
    async fn play(&self) -> ApiResult<T> {
        match self {
            Script::Respond(value) => Ok(value.clone()),
            Script::Delayed(delay, value) => {
                tokio::time::sleep(*delay).await;
                Ok(value.clone())
            }
            Script::Fail(e) => Err(e.clone()),
            Script::Hang => std::future::pending().await,
            Script::Panic => panic!("scripted backend panic"),
        }
    }
}

pub struct FakeBackend {
    pub login: Mutex<Script<LoginResponse>>,
    pub verify: Mutex<Script<UserProfile>>,
    pub logout: Mutex<Script<()>>,
    pub login_calls: AtomicUsize,
    pub verify_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub logout_all_calls: AtomicUsize,
    /// Tokens sent to logout and logout-all, in call order.
    pub revoked: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            login: Mutex::new(Script::Fail(ApiError::Unauthorized)),
            verify: Mutex::new(Script::Fail(ApiError::Unauthorized)),
            logout: Mutex::new(Script::Respond(())),
            login_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            logout_all_calls: AtomicUsize::new(0),
            revoked: Mutex::new(Vec::new()),
        }
    }

    pub fn with_verify(self, script: Script<UserProfile>) -> Self {
        *self.verify.lock() = script;
        self
    }

    pub fn with_login(self, script: Script<LoginResponse>) -> Self {
        *self.login.lock() = script;
        self
    }

    pub fn with_logout(self, script: Script<()>) -> Self {
        *self.logout.lock() = script;
        self
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthBackend for FakeBackend {
    async fn login(&self, _request: &LoginRequest) -> ApiResult<LoginResponse> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.login.lock().clone();
        script.play().await
    }

    async fn verify(&self) -> ApiResult<UserProfile> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.verify.lock().clone();
        script.play().await
    }

    async fn logout(&self, credential: &Credential) -> ApiResult<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        self.revoked.lock().push(credential.expose().to_string());
        let script = self.logout.lock().clone();
        script.play().await
    }

    async fn logout_all(&self, credential: &Credential) -> ApiResult<()> {
        self.logout_all_calls.fetch_add(1, Ordering::SeqCst);
        self.revoked.lock().push(credential.expose().to_string());
        let script = self.logout.lock().clone();
        script.play().await
    }
}

/// Storage whose calls never complete.
pub struct HangingStorage;

#[async_trait]
impl SecureStorage for HangingStorage {
    async fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        std::future::pending().await
    }

    async fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        std::future::pending().await
    }

    async fn delete(&self, _key: &str) -> StorageResult<bool> {
        std::future::pending().await
    }
}

/// Storage whose calls always fail.
pub struct FailingStorage;

#[async_trait]
impl SecureStorage for FailingStorage {
    async fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Backend("decryption failed".into()))
    }

    async fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Err(StorageError::Backend("decryption failed".into()))
    }

    async fn delete(&self, _key: &str) -> StorageResult<bool> {
        Err(StorageError::Backend("decryption failed".into()))
    }
}

pub const STORAGE_TIMEOUT: Duration = Duration::from_secs(3);

/// A memory-backed store, optionally seeded with a token.
pub async fn memory_store(token: Option<&str>) -> (Arc<MemoryStorage>, CredentialStore) {
    let backend = Arc::new(MemoryStorage::new());
    if let Some(token) = token {
        backend.set(StorageKeys::AUTH_TOKEN, token).await.unwrap();
    }
    let store = CredentialStore::new(backend.clone(), STORAGE_TIMEOUT);
    (backend, store)
}
