//! sqlite-node - parameterized query execution against SQLite database files.
//!
//! A request names a database file, a query with `$name` placeholders and a
//! JSON object of arguments. The query type is detected when not given,
//! arguments are filtered down to the ones the query mentions, the query is
//! run in the matching mode, and the result is shaped into output records.

pub mod batch;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod output;
pub mod query;

pub use batch::{BatchRunner, FailurePolicy};
pub use error::{NodeError, Result};
pub use output::OutputRecord;
pub use query::{QueryType, Request};
