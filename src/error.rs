//! Error types for sqlite-node.
//!
//! Defines the main error enum used throughout the crate.

use thiserror::Error;

/// Main error type for query node operations.
#[derive(Error, Debug)]
pub enum NodeError {
    /// Request rejected before touching the database (empty path, empty query).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The argument string is not a JSON object.
    #[error("Argument error: {0}")]
    ArgumentParse(String),

    /// Query execution errors (syntax errors, constraint violations, I/O, etc.)
    #[error("Query error: {0}")]
    QueryExecution(String),

    /// Configuration errors (invalid config file, bad values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Batch input could not be read or decoded.
    #[error("Input error: {0}")]
    Input(String),

    /// A request failed while processing a batch in fail-fast mode.
    #[error("Item {index}: {source}")]
    Item {
        index: usize,
        #[source]
        source: Box<NodeError>,
    },
}

impl NodeError {
    /// Creates an invalid request error with the given message.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Creates an argument parse error with the given message.
    pub fn argument(msg: impl Into<String>) -> Self {
        Self::ArgumentParse(msg.into())
    }

    /// Creates a query execution error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryExecution(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an input error with the given message.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Attaches the index of the failing batch item.
    ///
    /// An error that already carries an index keeps its original context and
    /// only has the index replaced.
    pub fn with_item_index(self, index: usize) -> Self {
        match self {
            Self::Item { source, .. } => Self::Item { index, source },
            other => Self::Item {
                index,
                source: Box::new(other),
            },
        }
    }

    /// Returns the batch item index, if one has been attached.
    pub fn item_index(&self) -> Option<usize> {
        match self {
            Self::Item { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Returns the message without the category prefix.
    ///
    /// This is what ends up in inline `{"error": ...}` records.
    pub fn message(&self) -> String {
        match self {
            Self::InvalidRequest(msg)
            | Self::ArgumentParse(msg)
            | Self::QueryExecution(msg)
            | Self::Config(msg)
            | Self::Input(msg) => msg.clone(),
            Self::Item { source, .. } => source.message(),
        }
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "Invalid Request",
            Self::ArgumentParse(_) => "Argument Error",
            Self::QueryExecution(_) => "Query Error",
            Self::Config(_) => "Configuration Error",
            Self::Input(_) => "Input Error",
            Self::Item { source, .. } => source.category(),
        }
    }
}

/// Result type alias using NodeError.
pub type Result<T> = std::result::Result<T, NodeError>;
