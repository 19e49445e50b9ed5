//! Wire types for the auth endpoints, and payload validation.

use deskhub_storage::Credential;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape check applied to every decoded success payload.
///
/// Serde already rejects missing required fields; this catches values that
/// decode but are unusable (an empty token, a user without an email).
pub trait Validate {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

impl Validate for serde_json::Value {}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), String> {
        self.iter().try_for_each(Validate::validate)
    }
}

/// Server-side identifier. The backend sends numbers, some proxies stringify them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Number(u64),
    Text(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Number(n) => write!(f, "{}", n),
            Id::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for Id {
    fn from(n: u64) -> Self {
        Id::Number(n)
    }
}

impl std::str::FromStr for Id {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<u64>()
            .map(Id::Number)
            .unwrap_or_else(|_| Id::Text(s.to_string())))
    }
}

/// The authenticated staff user. Fields beyond the ones the client reads are
/// kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Id,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    /// Name for display, falling back to the email address.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

impl Validate for UserProfile {
    fn validate(&self) -> Result<(), String> {
        if self.email.trim().is_empty() {
            return Err("user.email is empty".to_string());
        }
        Ok(())
    }
}

/// `POST /auth/login` body.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub device_name: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("device_name", &self.device_name)
            .finish()
    }
}

/// `POST /auth/login` success payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user: UserProfile,
    pub token: String,
}

impl Validate for LoginResponse {
    fn validate(&self) -> Result<(), String> {
        if !Credential::new(self.token.as_str()).is_well_formed() {
            return Err("token is empty or not printable ASCII".to_string());
        }
        self.user.validate()
    }
}

/// `POST /auth/refresh` success payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub token: String,
}

impl Validate for RefreshResponse {
    fn validate(&self) -> Result<(), String> {
        if self.token.trim().is_empty() {
            return Err("token is empty".to_string());
        }
        Ok(())
    }
}

/// `{ "user": ... }`, returned by verify and the profile endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct UserEnvelope {
    pub user: UserProfile,
}

impl Validate for UserEnvelope {
    fn validate(&self) -> Result<(), String> {
        self.user.validate()
    }
}

/// `PUT /auth/profile` with contact details.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// `PUT /auth/profile` with a password change.
#[derive(Clone, Serialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirmation: String,
}

impl PasswordChange {
    pub fn new(current: impl Into<String>, new: impl Into<String>) -> Self {
        let new = new.into();
        Self {
            current_password: current.into(),
            new_password_confirmation: new.clone(),
            new_password: new,
        }
    }
}

impl fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordChange([REDACTED])")
    }
}

/// A device token as listed by `GET /auth/sessions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSession {
    pub id: Id,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub last_used_at: Option<String>,
    #[serde(default)]
    pub is_current: bool,
}

impl Validate for DeviceSession {}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionsResponse {
    pub sessions: Vec<DeviceSession>,
}

impl Validate for SessionsResponse {}
