//! API error types.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Details the server attaches to a 403 for a suspended account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Suspension {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub suspended_until: Option<String>,
}

/// Error type for requests through the pipeline.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// Server unreachable, DNS failure, connection reset
    #[error("Network error: {0}")]
    Network(String),

    /// The HTTP client timed out
    #[error("Request timed out")]
    Timeout,

    /// 401 that survived the refresh protocol
    #[error("Unauthorized")]
    Unauthorized,

    /// 403, with suspension details when the account is suspended
    #[error("Forbidden: {}", .message.as_deref().unwrap_or("access denied"))]
    Forbidden {
        message: Option<String>,
        suspension: Option<Suspension>,
    },

    /// 429
    #[error("Rate limited")]
    RateLimited { retry_after: Option<u64> },

    /// 422 with the server's field errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        errors: serde_json::Value,
    },

    /// 5xx
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Any other non-success status
    #[error("Unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// A success response whose body is missing required fields
    #[error("Malformed response payload: {0}")]
    MalformedPayload(String),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Client could not be constructed
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Common shape of error bodies returned by the server.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
    #[serde(default)]
    suspension_details: Option<Suspension>,
}

impl ApiError {
    /// Map a non-success status and its body to an error.
    pub fn from_status(status: StatusCode, retry_after: Option<u64>, body: &[u8]) -> Self {
        let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
        let message = parsed.message.or(parsed.error);

        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden {
                message,
                suspension: parsed.suspension_details,
            },
            429 => ApiError::RateLimited { retry_after },
            422 => ApiError::Validation {
                message: message.unwrap_or_else(|| "The given data was invalid".to_string()),
                errors: parsed.errors.unwrap_or(serde_json::Value::Null),
            },
            code if status.is_server_error() => ApiError::Server {
                status: code,
                message: message.unwrap_or_else(|| status.to_string()),
            },
            code => ApiError::Status {
                status: code,
                message: message.unwrap_or_else(|| status.to_string()),
            },
        }
    }

    /// Returns true if the failure is worth retrying later.
    ///
    /// Transient errors include:
    /// - Network unavailable
    /// - Client-side timeouts
    /// - 5xx responses
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_) | ApiError::Timeout | ApiError::Server { .. }
        )
    }

    /// Server-supplied human-readable message, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Forbidden { message, .. } => message.as_deref(),
            ApiError::Validation { message, .. }
            | ApiError::Server { message, .. }
            | ApiError::Status { message, .. } => Some(message),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::MalformedPayload(e.to_string())
        } else if e.is_builder() {
            ApiError::Config(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;
