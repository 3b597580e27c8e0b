//! Logging configuration for aql-exec.
//!
//! Diagnostics (request timings, skipped bind variables, failed units) go
//! through `tracing`. The headless binary logs to stderr so stdout carries only
//! results. `--log-file` redirects diagnostics to a file instead, which is what
//! editor integrations use since they usually discard stderr.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::error::{AqlExecError, Result};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Creates `path` and its parent directories, truncating an existing log.
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                AqlExecError::config(format!("log directory {}: {e}", parent.display()))
            })?;
        }
    }
    File::create(path).map_err(|e| AqlExecError::config(format!("log file {}: {e}", path.display())))
}

/// Sends logs to `path` without ANSI colors.
///
/// Fails if the file cannot be created or a subscriber is already installed.
pub fn init_file_logging(path: &Path) -> Result<()> {
    let log_file = open_log_file(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(log_file)
        .with_ansi(false)
        .try_init()
        .map_err(|e| AqlExecError::internal(format!("logging already initialized: {e}")))
}

/// Initializes logging to stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Default log file: `aql-exec/aql-exec.log` under the platform state
/// directory, falling back to the config directory, then the temp directory.
pub fn get_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        return state_dir.join("aql-exec").join("aql-exec.log");
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("aql-exec").join("aql-exec.log");
    }

    std::env::temp_dir().join("aql-exec.log")
}
