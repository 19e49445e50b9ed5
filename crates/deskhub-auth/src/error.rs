//! Authentication error types.

use deskhub_api::ApiError;
use serde::Serialize;
use thiserror::Error;

/// Authentication error type.
#[derive(Error, Debug, Clone)]
pub enum AuthError {
    /// Wrong email or password (401 on login)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Account suspended by an administrator (403 with suspension details)
    #[error("Account suspended{}", .reason.as_deref().map(|r| format!(": {}", r)).unwrap_or_default())]
    AccountSuspended { reason: Option<String> },

    /// Authenticated, but not a support staff account (403)
    #[error("Insufficient permissions")]
    InsufficientPermissions,

    /// Too many attempts (429)
    #[error("Too many attempts")]
    RateLimited { retry_after: Option<u64> },

    /// Server unreachable
    #[error("Network unavailable: {0}")]
    Network(String),

    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,

    /// Success response without the expected fields
    #[error("Malformed server response: {0}")]
    MalformedResponse(String),

    /// Login succeeded on the server but the credential could not be stored
    #[error("Credential could not be saved")]
    CredentialNotSaved,

    /// Invalid state transition in the session FSM
    #[error("Invalid auth state transition: {0}")]
    InvalidStateTransition(String),

    /// No active session
    #[error("Not logged in")]
    NotAuthenticated,

    /// Any other API failure
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

/// Non-blocking, user-facing notification for an auth failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
}

impl Notice {
    fn new(title: &str, description: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
        }
    }
}

impl AuthError {
    /// Map a failed `POST /auth/login` to a user-facing category.
    pub fn from_login_failure(error: ApiError) -> Self {
        match error {
            ApiError::Unauthorized => AuthError::InvalidCredentials,
            ApiError::Forbidden {
                suspension: Some(suspension),
                ..
            } => AuthError::AccountSuspended {
                reason: suspension.reason,
            },
            ApiError::Forbidden { .. } => AuthError::InsufficientPermissions,
            ApiError::RateLimited { retry_after } => AuthError::RateLimited { retry_after },
            ApiError::Network(msg) => AuthError::Network(msg),
            ApiError::Timeout => AuthError::Timeout,
            ApiError::MalformedPayload(msg) => AuthError::MalformedResponse(msg),
            other => AuthError::Api(other),
        }
    }

    /// Returns true if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Network(_) | AuthError::Timeout => true,
            AuthError::Api(e) => e.is_transient(),
            _ => false,
        }
    }

    /// The notification to show for this error.
    pub fn notice(&self) -> Notice {
        match self {
            AuthError::InvalidCredentials => Notice::new(
                "Invalid login details",
                "Please check your email and password",
            ),
            AuthError::AccountSuspended { reason } => Notice::new(
                "Account suspended",
                match reason {
                    Some(reason) => format!("Reason: {}", reason),
                    None => "Please contact an administrator".to_string(),
                },
            ),
            AuthError::InsufficientPermissions => Notice::new(
                "Access denied",
                "Support staff permissions are required",
            ),
            AuthError::RateLimited { .. } => Notice::new(
                "Too many login attempts",
                "Please wait a few minutes and try again",
            ),
            AuthError::Network(_) => Notice::new(
                "Network error",
                "Please check your internet connection",
            ),
            AuthError::Timeout => Notice::new("Server not responding", "Please try again"),
            AuthError::MalformedResponse(_) => {
                Notice::new("Unexpected server response", "Please try again")
            }
            AuthError::CredentialNotSaved => Notice::new(
                "Could not save session",
                "Secure storage is unavailable, please try again",
            ),
            AuthError::NotAuthenticated => Notice::new("Session expired", "Please log in again"),
            AuthError::InvalidStateTransition(detail) => {
                Notice::new("Action not available", detail.clone())
            }
            AuthError::Api(e) => Notice::new(
                "Request failed",
                e.server_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| "Please try again".to_string()),
            ),
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;
    use deskhub_api::Suspension;

    #[test]
    fn test_login_failure_unauthorized() {
        assert!(matches!(
            AuthError::from_login_failure(ApiError::Unauthorized),
            AuthError::InvalidCredentials
        ));
    }

    #[test]
    fn test_login_failure_suspended() {
        let err = AuthError::from_login_failure(ApiError::Forbidden {
            message: None,
            suspension: Some(Suspension {
                reason: Some("Chargeback".into()),
                suspended_until: None,
            }),
        });
        assert!(matches!(
            &err,
            AuthError::AccountSuspended { reason: Some(r) } if r == "Chargeback"
        ));
        assert_eq!(err.notice().description, "Reason: Chargeback");
    }

    #[test]
    fn test_login_failure_forbidden_without_suspension() {
        let err = AuthError::from_login_failure(ApiError::Forbidden {
            message: Some("nope".into()),
            suspension: None,
        });
        assert!(matches!(err, AuthError::InsufficientPermissions));
    }

    #[test]
    fn test_login_failure_rate_limited_and_network() {
        assert!(matches!(
            AuthError::from_login_failure(ApiError::RateLimited { retry_after: None }),
            AuthError::RateLimited { .. }
        ));
        let network = AuthError::from_login_failure(ApiError::Network("refused".into()));
        assert!(network.is_transient());
        assert_eq!(network.notice().title, "Network error");
    }

    #[test]
    fn test_malformed_login_payload() {
        let err = AuthError::from_login_failure(ApiError::MalformedPayload("bad token".into()));
        assert!(matches!(err, AuthError::MalformedResponse(_)));
        assert_eq!(err.notice().title, "Unexpected server response");
    }

    #[test]
    fn test_is_not_transient_invalid_credentials() {
        assert!(!AuthError::InvalidCredentials.is_transient());
        assert!(!AuthError::NotAuthenticated.is_transient());
    }

    #[test]
    fn test_api_notice_uses_server_message() {
        let err = AuthError::Api(ApiError::Validation {
            message: "The email must be valid".into(),
            errors: serde_json::Value::Null,
        });
        assert_eq!(err.notice().description, "The email must be valid");
    }
}
