//! Command-line argument parsing for sqlite-node.

use crate::config::Config;
use crate::error::{NodeError, Result};
use crate::query::{QueryType, Request};
use clap::builder::PossibleValue;
use clap::{Parser, ValueEnum};
use std::io::Read;
use std::path::PathBuf;

/// Run parameterized queries against local SQLite database files.
///
/// Either pass a single request with --db and --query, or a batch of
/// requests with --input (a JSON array or one JSON object per line).
#[derive(Parser, Debug)]
#[command(name = "sqlite-node")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the SQLite database file (or :memory:)
    #[arg(short = 'd', long = "db", value_name = "PATH")]
    pub db_path: Option<String>,

    /// SQL query, with $name placeholders
    #[arg(short = 'q', long, value_name = "SQL")]
    pub query: Option<String>,

    /// Query type
    #[arg(
        short = 't',
        long = "type",
        value_name = "TYPE",
        value_enum,
        ignore_case = true,
        default_value_t = QueryType::Auto
    )]
    pub query_type: QueryType,

    /// Arguments as a JSON object, e.g. '{"$key": "value"}'
    #[arg(short = 'a', long, value_name = "JSON", default_value = "{}")]
    pub args: String,

    /// Emit one record per result element (SELECT only)
    #[arg(short = 's', long)]
    pub spread: bool,

    /// Read a batch of requests from a file (use "-" for stdin)
    #[arg(short = 'i', long, value_name = "PATH", conflicts_with_all = ["db_path", "query"])]
    pub input: Option<String>,

    /// Emit an error record for a failed request instead of aborting
    #[arg(long)]
    pub continue_on_fail: bool,

    /// Config file path
    #[arg(long, value_name = "PATH", env = "SQLITE_NODE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pub pretty: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Applies command-line overrides to the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if self.continue_on_fail {
            config.batch.continue_on_fail = true;
        }
    }

    /// Builds the requests to run, from --input or from the single-request flags.
    pub fn requests(&self) -> Result<Vec<Request>> {
        match &self.input {
            Some(path) => parse_requests(&read_input(path)?),
            None => Ok(vec![self.single_request()]),
        }
    }

    /// Builds one request from --db, --query, --type, --args and --spread.
    ///
    /// Missing path or query become empty strings and are rejected by the
    /// executor like any other invalid request.
    pub fn single_request(&self) -> Request {
        Request {
            database_path: self.db_path.clone().unwrap_or_default(),
            query_type: self.query_type,
            query: self.query.clone().unwrap_or_default(),
            args: self.args.clone(),
            spread: self.spread,
        }
    }
}

impl ValueEnum for QueryType {
    fn value_variants<'a>() -> &'a [Self] {
        &Self::ALL
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(PossibleValue::new(self.as_str()).help(self.description()))
    }
}

/// Reads batch input from a file, or from stdin for "-".
fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .map_err(|e| NodeError::input(format!("Failed to read stdin: {e}")))?;
        return Ok(content);
    }

    std::fs::read_to_string(path)
        .map_err(|e| NodeError::input(format!("Failed to read {path}: {e}")))
}

/// Parses batch input: a JSON array of requests, or one request per line.
pub fn parse_requests(content: &str) -> Result<Vec<Request>> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed)
            .map_err(|e| NodeError::input(format!("Invalid request array: {e}")));
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str(line).map_err(|e| {
                NodeError::input(format!("Invalid request on line {}: {e}", number + 1))
            })
        })
        .collect()
}
