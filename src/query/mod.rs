//! Query classification, argument binding and execution.
//!
//! A [`Request`] flows through [`classifier`], [`arguments`] and
//! [`executor`] in that order; shaping the result happens in
//! [`crate::output`].

pub mod arguments;
pub mod classifier;
pub mod executor;

pub use arguments::{bind, normalize, parse_arguments, Arguments, BoundStatement};
pub use classifier::{classify, count_statements, split_statements};
pub use executor::{Execution, ExecutionResult, QueryExecutor};

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Kind of SQL operation a request performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryType {
    /// Detect the type from the query text.
    #[default]
    Auto,
    Create,
    Select,
    Insert,
    Update,
    Delete,
}

impl QueryType {
    /// All query types, in the order they are offered to users.
    pub const ALL: [QueryType; 6] = [
        Self::Auto,
        Self::Create,
        Self::Delete,
        Self::Insert,
        Self::Select,
        Self::Update,
    ];

    /// Returns the type as its SQL keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "AUTO",
            Self::Create => "CREATE",
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }

    /// Returns a short description for help output.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Auto => "Automatically detect the query type",
            Self::Create => "Create a table",
            Self::Delete => "Delete rows from a table",
            Self::Insert => "Insert rows into a table",
            Self::Select => "Select rows from a table (support for multiple queries)",
            Self::Update => "Update rows in a table",
        }
    }

    /// Returns true for INSERT, UPDATE and DELETE.
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Insert | Self::Update | Self::Delete)
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QueryType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Invalid query type: {s}. Expected one of: AUTO, CREATE, DELETE, INSERT, SELECT, UPDATE"
                )
            })
    }
}

/// One unit of work: a query against one database file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Path to the SQLite database file, or `:memory:`.
    #[serde(alias = "db_path")]
    pub database_path: String,

    /// Declared query type; AUTO detects it from the text.
    #[serde(default)]
    pub query_type: QueryType,

    /// SQL text, using `$name` placeholders.
    pub query: String,

    /// JSON object of arguments keyed by `$name` (or `name`).
    #[serde(default = "default_args", deserialize_with = "deserialize_args")]
    pub args: String,

    /// Emit one output record per result element (SELECT only).
    #[serde(default)]
    pub spread: bool,
}

fn default_args() -> String {
    "{}".to_string()
}

/// Accepts `args` either as JSON text or as an inline JSON value.
fn deserialize_args<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => default_args(),
        other => other.to_string(),
    })
}

impl Request {
    /// Creates a request with AUTO type, no arguments and no spreading.
    pub fn new(database_path: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            database_path: database_path.into(),
            query_type: QueryType::Auto,
            query: query.into(),
            args: default_args(),
            spread: false,
        }
    }

    /// Sets the declared query type.
    pub fn with_type(mut self, query_type: QueryType) -> Self {
        self.query_type = query_type;
        self
    }

    /// Sets the raw JSON argument text.
    pub fn with_args(mut self, args: impl Into<String>) -> Self {
        self.args = args.into();
        self
    }

    /// Sets the spread flag.
    pub fn with_spread(mut self, spread: bool) -> Self {
        self.spread = spread;
        self
    }
}
