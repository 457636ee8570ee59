//! Logging configuration for smart-line.
//!
//! Logs go to stderr by default so they never interleave with the dialogue on
//! stdout, or to a file when one is configured.

use crate::config::LoggingConfig;
use std::fs::{self, File};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initializes logging from the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(config: &LoggingConfig) {
    match &config.file {
        Some(path) => init_file_logging(path, &config.level),
        None => init_stderr_logging(&config.level),
    }
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initializes logging to a file, truncated on each run.
///
/// Falls back to stderr if the file cannot be created.
pub fn init_file_logging(path: &Path, level: &str) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            init_stderr_logging(level);
            return;
        }
    }

    let log_file = match File::create(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {e}");
            init_stderr_logging(level);
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(log_file)
        .with_ansi(false)
        .init();
}

/// Initializes logging to stderr.
pub fn init_stderr_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr)
        .init();
}
