//! Logging configuration for sqlite-node.
//!
//! Output records go to stdout, so logs are written to stderr or, when
//! requested, to a file.

use std::fs::{self, File};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes logging to stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Initializes logging to a file, truncated on each run.
///
/// Falls back to stderr logging if the file cannot be created.
pub fn init_file_logging(log_path: &Path) {
    if let Some(parent) = log_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            init_stderr_logging();
            return;
        }
    }

    let log_file = match File::create(log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {e}");
            init_stderr_logging();
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(log_file)
        .with_ansi(false) // No ANSI colors in file output
        .init();
}
