//! Logging setup shared by deskhub binaries.

use crate::{CoreResult, Paths};

/// Service name written into every log line.
pub const SERVICE_NAME: &str = "deskhub-cli";

/// Install structured logging: JSONL to `~/.deskhub/logs/deskhub.jsonl`, and
/// compact output on stderr when `also_stderr` is set.
///
/// `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: &str, paths: &Paths, also_stderr: bool) -> CoreResult<()> {
    paths.ensure_dirs()?;

    observability::init_with_config(observability::LogConfig {
        service_name: SERVICE_NAME.to_string(),
        default_level: level.to_string(),
        log_path: Some(paths.log_file()),
        also_stderr,
    })?;

    Ok(())
}
