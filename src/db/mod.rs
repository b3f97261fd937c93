//! Database abstraction layer for sqlite-node.
//!
//! Provides a trait-based interface for database operations so the query
//! pipeline can run against SQLite or an in-memory mock interchangeably.

mod mock;
mod sqlite;
mod types;

pub use mock::{MockCall, MockConnector, MockDatabaseClient, MockState};
pub use sqlite::{SqliteClient, SqliteConnector};
pub use types::{MutationResult, QueryResult, Row, Value};

use crate::error::Result;
use async_trait::async_trait;

/// Path that selects a private in-memory database instead of a file.
const MEMORY_PATH: &str = ":memory:";

/// Returns true if the path addresses an in-memory database.
pub fn is_memory_path(path: &str) -> bool {
    path.trim() == MEMORY_PATH
}

/// Trait defining the interface for database clients.
///
/// A client is a request-scoped handle: it is opened once, used for every
/// statement of one request, and closed once. Statements take `?N`
/// placeholders with `params[N - 1]` bound to each.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a row-returning statement and collects all rows.
    async fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<QueryResult>;

    /// Executes a data-modifying statement and reports affected rows.
    async fn run(&self, sql: &str, params: &[Value]) -> Result<MutationResult>;

    /// Executes raw SQL (possibly several statements) without binding.
    async fn exec(&self, sql: &str) -> Result<()>;

    /// Closes the handle and every connection behind it.
    async fn close(&self) -> Result<()>;
}

/// Opens database handles for requests.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a handle on the database at `path`.
    ///
    /// `max_connections` bounds how many statements may run on the handle at
    /// the same time.
    async fn open(&self, path: &str, max_connections: u32) -> Result<Box<dyn DatabaseClient>>;
}
