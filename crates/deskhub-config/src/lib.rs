//! Configuration, file system paths, and logging setup for the deskhub client.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, TimeoutConfig, APP_NAME, DEFAULT_API_URL, DEFAULT_BOOTSTRAP_DEADLINE_MS,
    DEFAULT_LOG_LEVEL, DEFAULT_LOGOUT_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_MS,
    DEFAULT_STORAGE_TIMEOUT_MS, DEFAULT_VERIFY_DEADLINE_MS,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, SERVICE_NAME};
pub use paths::Paths;
