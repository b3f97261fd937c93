//! Output records and result shaping.
//!
//! Every request produces one record, except a SELECT with `spread` set,
//! which produces one record per element of its result.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::query::{ExecutionResult, QueryType};

/// Field wrapping a statement's rows when a split SELECT is spread.
pub const ITEMS_FIELD: &str = "items";

/// Message used when a failure carries no text.
const UNKNOWN_ERROR: &str = "Unknown error";

/// One record handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// Record payload.
    pub json: serde_json::Value,

    /// Index of the request this record came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_index: Option<usize>,
}

impl OutputRecord {
    /// Creates a record for the request at `source_index`.
    pub fn new(json: serde_json::Value, source_index: usize) -> Self {
        Self {
            json,
            source_index: Some(source_index),
        }
    }

    /// Creates an inline error record for a failed request.
    pub fn error(message: &str, source_index: usize) -> Self {
        let message = if message.is_empty() {
            UNKNOWN_ERROR
        } else {
            message
        };
        Self::new(json!({ "error": message }), source_index)
    }

    /// Returns the error message if this is an error record.
    pub fn error_message(&self) -> Option<&str> {
        self.json.get("error").and_then(serde_json::Value::as_str)
    }
}

/// Shapes an execution result into output payloads.
///
/// With `spread` on a SELECT, each element of the result becomes its own
/// payload: a nested row list (from a split SELECT) is wrapped as
/// `{"items": [...]}`, a plain row is emitted as-is. Anything else yields
/// exactly one payload holding the whole result.
pub fn shape(
    query_type: QueryType,
    spread: bool,
    result: &ExecutionResult,
) -> Vec<serde_json::Value> {
    let payload = result.to_json();

    if query_type != QueryType::Select || !spread {
        return vec![payload];
    }

    match payload {
        serde_json::Value::Array(elements) => elements
            .into_iter()
            .map(|element| match element {
                rows @ serde_json::Value::Array(_) => json!({ ITEMS_FIELD: rows }),
                other => other,
            })
            .collect(),
        other => vec![other],
    }
}
