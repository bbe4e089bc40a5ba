//! Logging configuration for SecureCheck.
//!
//! Logs go to stderr by default so stdout stays clean for tables and JSON.
//! With `--log-file` they are written to a file in the platform state
//! directory instead.

use std::fs::{self, File};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes logging to a file.
///
/// Location: `~/.local/state/secure-check/secure-check.log` on Linux (XDG
/// state directory), or the platform-appropriate directory elsewhere. If the
/// file cannot be created, logging falls back to stderr.
pub fn init_file_logging() {
    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            return init_stderr_logging();
        }
    }

    // Truncated on each run
    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {e}");
            return init_stderr_logging();
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(log_file)
        .with_ansi(false)
        .init();
}

/// Initializes logging to stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Returns the path for the log file.
///
/// Uses the XDG state directory on Linux, falling back to the config
/// directory and then the temp directory on other platforms.
pub fn get_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        return state_dir.join("secure-check").join("secure-check.log");
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("secure-check").join("secure-check.log");
    }

    std::env::temp_dir().join("secure-check.log")
}
