//! Tracing subscriber setup for the binaries

use std::path::Path;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;
use crate::error::CoreError;

/// Install the global subscriber
///
/// `RUST_LOG` wins over `level` when set.
///
/// # Errors
/// Returns an error if `level` is not a valid filter or a subscriber is
/// already installed
pub fn init(level: &str, format: LogFormat) -> Result<(), CoreError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| CoreError::ConfigError(format!("invalid log level {level:?}: {e}")))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
    };
    installed.map_err(|e| CoreError::ConfigError(format!("failed to install logger: {e}")))
}

/// Report where the configuration came from, once a subscriber is installed
pub fn config_source(path: Option<&Path>) {
    match path {
        Some(path) => info!(path = %path.display(), "loaded config file"),
        None => warn!("no config file found, using defaults"),
    }
}
