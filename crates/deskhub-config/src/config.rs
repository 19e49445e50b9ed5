//! Client configuration.
//!
//! Values are layered: built-in defaults, then `~/.deskhub/config.json`, then
//! `DESKHUB_*` environment variables. The binary applies its own flags last.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Product name, used in the default device name.
pub const APP_NAME: &str = "NM-DigitalHUB";

/// Default API base URL (can be overridden at compile time via DESKHUB_API_URL).
pub const DEFAULT_API_URL: &str = match option_env!("DESKHUB_API_URL") {
    Some(url) => url,
    None => "https://nm-digitalhub.com/api",
};

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_BOOTSTRAP_DEADLINE_MS: u64 = 10_000;
pub const DEFAULT_VERIFY_DEADLINE_MS: u64 = 8_000;
// Longer than the bootstrap deadline; bootstrap bounds verification separately.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_STORAGE_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_LOGOUT_TIMEOUT_MS: u64 = 5_000;

/// Timing knobs for the auth bootstrap and the request pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Hard deadline for the whole startup auth check.
    pub bootstrap_deadline_ms: u64,
    /// Deadline for the server verification step. Must be shorter than
    /// `bootstrap_deadline_ms`; the gap is the budget for cleanup.
    pub verify_deadline_ms: u64,
    /// Per-request timeout of the HTTP client.
    pub request_timeout_ms: u64,
    /// Bound on each credential storage operation.
    pub storage_timeout_ms: u64,
    /// Bound on the best-effort server notification during logout.
    pub logout_timeout_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            bootstrap_deadline_ms: DEFAULT_BOOTSTRAP_DEADLINE_MS,
            verify_deadline_ms: DEFAULT_VERIFY_DEADLINE_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            storage_timeout_ms: DEFAULT_STORAGE_TIMEOUT_MS,
            logout_timeout_ms: DEFAULT_LOGOUT_TIMEOUT_MS,
        }
    }
}

impl TimeoutConfig {
    pub fn bootstrap_deadline(&self) -> Duration {
        Duration::from_millis(self.bootstrap_deadline_ms)
    }

    pub fn verify_deadline(&self) -> Duration {
        Duration::from_millis(self.verify_deadline_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }

    pub fn logout_timeout(&self) -> Duration {
        Duration::from_millis(self.logout_timeout_ms)
    }

    fn validate(&self) -> CoreResult<()> {
        let named = [
            ("bootstrap_deadline_ms", self.bootstrap_deadline_ms),
            ("verify_deadline_ms", self.verify_deadline_ms),
            ("request_timeout_ms", self.request_timeout_ms),
            ("storage_timeout_ms", self.storage_timeout_ms),
            ("logout_timeout_ms", self.logout_timeout_ms),
        ];
        if let Some((name, _)) = named.iter().find(|(_, value)| *value == 0) {
            return Err(CoreError::Config(format!("{} must be greater than zero", name)));
        }

        if self.verify_deadline_ms >= self.bootstrap_deadline_ms {
            return Err(CoreError::Config(format!(
                "verify_deadline_ms ({}) must be shorter than bootstrap_deadline_ms ({})",
                self.verify_deadline_ms, self.bootstrap_deadline_ms
            )));
        }

        Ok(())
    }
}

/// Main client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// API base URL, e.g. `https://nm-digitalhub.com/api`.
    pub api_url: String,
    /// Name reported to the server on login.
    pub device_name: String,
    pub timeouts: TimeoutConfig,
}

fn default_device_name() -> String {
    format!("{} - {}", std::env::consts::OS, APP_NAME)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            device_name: default_device_name(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the config file (if present) and the
    /// environment, then validate it.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Override fields from `DESKHUB_*` variables resolved through `lookup`.
    ///
    /// Unparsable numeric values are ignored with a warning.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).and_then(non_empty);

        if let Some(level) = get("DESKHUB_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(url) = get("DESKHUB_API_URL") {
            self.api_url = url;
        }
        if let Some(name) = get("DESKHUB_DEVICE_NAME") {
            self.device_name = name;
        }

        let timeouts = &mut self.timeouts;
        let numeric = [
            ("DESKHUB_BOOTSTRAP_DEADLINE_MS", &mut timeouts.bootstrap_deadline_ms),
            ("DESKHUB_VERIFY_DEADLINE_MS", &mut timeouts.verify_deadline_ms),
            ("DESKHUB_REQUEST_TIMEOUT_MS", &mut timeouts.request_timeout_ms),
            ("DESKHUB_STORAGE_TIMEOUT_MS", &mut timeouts.storage_timeout_ms),
            ("DESKHUB_LOGOUT_TIMEOUT_MS", &mut timeouts.logout_timeout_ms),
        ];
        for (name, slot) in numeric {
            if let Some(raw) = get(name) {
                match raw.parse::<u64>() {
                    Ok(value) => *slot = value,
                    Err(_) => tracing::warn!(variable = name, value = %raw, "ignoring invalid duration"),
                }
            }
        }
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> CoreResult<()> {
        self.api_url()?;
        self.timeouts.validate()
    }

    /// The API base URL, parsed.
    pub fn api_url(&self) -> CoreResult<Url> {
        let url = Url::parse(&self.api_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CoreError::Config(format!(
                "api_url must be http or https, got {}",
                url.scheme()
            )));
        }
        Ok(url)
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
