//! Query result types for sqlite-node.
//!
//! Defines the structures used to represent bound arguments and query results.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number};

/// Rows returned by a single row-fetching statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names, in result order.
    pub columns: Vec<String>,

    /// Rows of data, one value per column.
    pub rows: Vec<Row>,
}

impl QueryResult {
    /// Creates a query result with the given columns and rows.
    pub fn with_data(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Converts every row into a JSON object keyed by column name.
    ///
    /// Column order is preserved. When a result repeats a column name the
    /// later value wins, which matches how SQLite drivers build row objects.
    pub fn to_json_rows(&self) -> Vec<serde_json::Value> {
        self.rows
            .iter()
            .map(|row| {
                let object: Map<String, serde_json::Value> = self
                    .columns
                    .iter()
                    .zip(row.iter())
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect();
                serde_json::Value::Object(object)
            })
            .collect()
    }
}

/// Outcome of an INSERT, UPDATE or DELETE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResult {
    /// Number of rows affected.
    pub changes: u64,

    /// Rowid of the last inserted row, if the connection inserted one.
    pub last_id: Option<i64>,
}

impl MutationResult {
    /// Builds a result from the raw counters reported by SQLite.
    ///
    /// SQLite reports rowid 0 when nothing was inserted on the connection.
    pub fn from_engine(changes: u64, last_insert_rowid: i64) -> Self {
        Self {
            changes,
            last_id: (last_insert_rowid != 0).then_some(last_insert_rowid),
        }
    }
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// Represents a single value bound to or read from the database.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value. SQLite stores it as 0/1.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text/string value.
    String(String),

    /// Binary data.
    Bytes(Vec<u8>),
}

impl Value {
    /// Converts a JSON argument into a bindable value.
    ///
    /// Arrays and objects have no SQLite counterpart and are bound as their
    /// JSON text, which keeps them usable with SQLite's JSON functions.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            other @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                Value::String(other.to_string())
            }
        }
    }

    /// Converts the value into JSON for output records.
    ///
    /// Blobs are base64 encoded; non-finite floats become null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::String(STANDARD.encode(b)),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}
