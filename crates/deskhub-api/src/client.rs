//! HTTP client with the credential interceptors.
//!
//! Outgoing: the stored credential, if any, is attached as a bearer token.
//! Incoming: a 401 on a request that has not been retried triggers one
//! refresh. A new credential is persisted and the request resent once; a
//! failed refresh clears the store and surfaces [`ApiError::Unauthorized`].
//! Refreshes are single-flight: requests that hit 401 together share one
//! `POST /auth/refresh`.

use crate::types::{RefreshResponse, Validate};
use crate::{ApiError, ApiResult, PendingRequest};
use deskhub_config::Config;
use deskhub_storage::{Credential, CredentialStore};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, RETRY_AFTER};
use reqwest::Client;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

const USER_AGENT: &str = concat!("deskhub/", env!("CARGO_PKG_VERSION"));

/// The single HTTP client shared by every endpoint group.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    credentials: CredentialStore,
    refresh_gate: Arc<Mutex<()>>,
}

impl ApiClient {
    pub fn new(
        base_url: &Url,
        request_timeout: Duration,
        credentials: CredentialStore,
    ) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(request_timeout)
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            credentials,
            refresh_gate: Arc::new(Mutex::new(())),
        })
    }

    pub fn from_config(config: &Config, credentials: CredentialStore) -> ApiResult<Self> {
        let base_url = config
            .api_url()
            .map_err(|e| ApiError::Config(e.to_string()))?;
        Self::new(&base_url, config.timeouts.request_timeout(), credentials)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Send a request and decode a validated payload.
    pub async fn send<T>(&self, request: PendingRequest) -> ApiResult<T>
    where
        T: DeserializeOwned + Validate,
    {
        let value = self.execute(request).await?;
        decode(value)
    }

    /// Send a request whose success body is not needed.
    pub async fn send_empty(&self, request: PendingRequest) -> ApiResult<()> {
        self.execute(request).await.map(|_| ())
    }

    /// Send with `credential` instead of the stored one. Never refreshes.
    pub async fn send_empty_as(
        &self,
        request: PendingRequest,
        credential: &Credential,
    ) -> ApiResult<()> {
        self.dispatch(&request.skip_refresh(), Some(credential))
            .await
            .map(|_| ())
    }

    /// Run a request through both interceptor stages.
    pub async fn execute(&self, mut request: PendingRequest) -> ApiResult<serde_json::Value> {
        let credential = self.credentials.get().await;

        match self.dispatch(&request, credential.as_ref()).await {
            Err(ApiError::Unauthorized) if !request.has_retried() => {
                request.mark_retried();
                match self.refresh_once(credential.as_ref()).await {
                    Ok(fresh) => {
                        debug!(path = %request.path(), "Resending request with refreshed credential");
                        self.dispatch(&request, Some(&fresh)).await
                    }
                    Err(e) => {
                        warn!(path = %request.path(), error = %e, "Credential refresh failed, clearing session");
                        self.credentials.clear().await;
                        Err(ApiError::Unauthorized)
                    }
                }
            }
            other => other,
        }
    }

    /// Refresh unless another request already replaced `rejected` while this
    /// one waited for the gate.
    async fn refresh_once(&self, rejected: Option<&Credential>) -> ApiResult<Credential> {
        let _gate = self.refresh_gate.lock().await;

        match self.credentials.get().await {
            Some(stored) if rejected != Some(&stored) => {
                debug!("Credential already refreshed by a concurrent request");
                Ok(stored)
            }
            _ => self.refresh(rejected).await,
        }
    }

    /// Exchange `current` for a new credential and persist it.
    ///
    /// The refresh request itself is never retried. The store is left
    /// untouched on failure; [`execute`](Self::execute) decides what to clear.
    pub async fn refresh(&self, current: Option<&Credential>) -> ApiResult<Credential> {
        let request = PendingRequest::post("/auth/refresh").skip_refresh();
        let value = self.dispatch(&request, current).await?;
        let payload: RefreshResponse = decode(value)?;

        let fresh = Credential::new(payload.token);
        if !fresh.is_well_formed() {
            return Err(ApiError::MalformedPayload(
                "refresh returned an unusable token".to_string(),
            ));
        }

        self.credentials.set(&fresh).await;
        info!("Credential refreshed");
        Ok(fresh)
    }

    async fn dispatch(
        &self,
        request: &PendingRequest,
        credential: Option<&Credential>,
    ) -> ApiResult<serde_json::Value> {
        let url = format!("{}{}", self.base_url, request.path());
        let mut builder = self.http.request(request.method().clone(), &url);

        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        if let Some(credential) = credential {
            builder = builder.bearer_auth(credential.expose());
        }

        debug!(
            method = %request.method(),
            path = %request.path(),
            authenticated = credential.is_some(),
            retried = request.has_retried(),
            "Sending request"
        );

        let response = builder.send().await.map_err(|e| {
            let err = ApiError::from(e);
            warn!(path = %request.path(), error = %err, "Request did not complete");
            err
        })?;

        let status = response.status();
        if status.is_success() {
            let bytes = response.bytes().await?;
            debug!(path = %request.path(), status = status.as_u16(), bytes = bytes.len(), "Response received");
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(serde_json::Value::Null);
            }
            return serde_json::from_slice(&bytes)
                .map_err(|e| ApiError::MalformedPayload(e.to_string()));
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.bytes().await.unwrap_or_default();

        warn!(
            method = %request.method(),
            path = %request.path(),
            status = status.as_u16(),
            body_len = body.len(),
            body_digest = %digest(&body),
            "Request failed"
        );

        Err(ApiError::from_status(status, retry_after, &body))
    }
}

/// Decode and validate a success payload.
pub(crate) fn decode<T>(value: serde_json::Value) -> ApiResult<T>
where
    T: DeserializeOwned + Validate,
{
    let payload: T =
        serde_json::from_value(value).map_err(|e| ApiError::MalformedPayload(e.to_string()))?;
    payload.validate().map_err(ApiError::MalformedPayload)?;
    Ok(payload)
}

/// First 8 bytes of the SHA-256 of `body`, hex encoded.
fn digest(body: &[u8]) -> String {
    Sha256::digest(body)
        .iter()
        .take(8)
        .map(|b| format!("{:02x}", b))
        .collect()
}
