//! A request description that can be sent more than once.

use crate::{ApiError, ApiResult};
use reqwest::Method;
use serde::Serialize;

/// A request plus the one-shot retry flag.
///
/// The pipeline resends a `PendingRequest` at most once after refreshing the
/// credential. Requests that must never trigger a refresh are built with
/// [`skip_refresh`](Self::skip_refresh).
#[derive(Debug, Clone)]
pub struct PendingRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    retried: bool,
}

impl PendingRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter. `None` values are left out.
    pub fn with_query(mut self, key: &str, value: Option<impl ToString>) -> Self {
        if let Some(value) = value {
            self.query.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// Set a JSON body.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> ApiResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Config(format!("cannot encode request body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Never refresh-and-retry this request on 401.
    pub fn skip_refresh(mut self) -> Self {
        self.retried = true;
        self
    }

    pub fn mark_retried(&mut self) {
        self.retried = true;
    }

    pub fn has_retried(&self) -> bool {
        self.retried
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }
}
