//! Configuration management for sqlite-node.
//!
//! Handles loading execution and batch settings from a TOML file. Every
//! setting has a default, so a missing file is not an error.

use crate::error::{NodeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// How requests are executed against the database.
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// How a batch of requests reacts to failures.
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Execution settings applied to every database handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Upper bound on split SELECT statements running at the same time.
    #[serde(default = "default_max_concurrent_statements")]
    pub max_concurrent_statements: u32,

    /// How long SQLite waits on a locked database, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Create the database file when it does not exist.
    #[serde(default = "default_create_if_missing")]
    pub create_if_missing: bool,
}

fn default_max_concurrent_statements() -> u32 {
    4
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_create_if_missing() -> bool {
    true
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_statements: default_max_concurrent_statements(),
            busy_timeout_ms: default_busy_timeout_ms(),
            create_if_missing: default_create_if_missing(),
        }
    }
}

/// Batch failure handling.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BatchConfig {
    /// Emit an inline error record for a failed request instead of aborting.
    #[serde(default)]
    pub continue_on_fail: bool,
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sqlite-node")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            NodeError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<()> {
        if self.execution.max_concurrent_statements == 0 {
            return Err(NodeError::config(
                "execution.max_concurrent_statements must be at least 1",
            ));
        }
        Ok(())
    }
}
