//! SQLite database client implementation.
//!
//! Provides the `SqliteClient` struct that implements the `DatabaseClient`
//! trait for SQLite database files using sqlx.

use crate::config::ExecutionConfig;
use crate::db::{
    is_memory_path, Connector, DatabaseClient, MutationResult, QueryResult, Row, Value,
};
use crate::error::{NodeError, Result};
use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Column, Executor, Row as SqlxRow, Statement, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Error for a statement run in row-fetching mode that returns no rows.
const NO_DATA: &str = "This statement does not return data";

/// SQLite database client backed by a request-scoped connection pool.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
}

impl SqliteClient {
    /// Opens the database at `path`, creating the file if configured to.
    pub async fn open(path: &str, config: &ExecutionConfig, max_connections: u32) -> Result<Self> {
        let options = connect_options(path, config)?;

        // Separate connections to `:memory:` would see separate databases.
        let max_connections = if is_memory_path(path) {
            1
        } else {
            max_connections.max(1)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(0)
            .connect_with(options)
            .await
            .map_err(|e| NodeError::query(format_query_error(e)))?;

        debug!(
            "Opened SQLite database {} with up to {} connection(s)",
            path, max_connections
        );
        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        // Only statements with result columns fetch rows.
        let statement = (&self.pool)
            .prepare(sql)
            .await
            .map_err(|e| NodeError::query(format_query_error(e)))?;
        if statement.columns().is_empty() {
            return Err(NodeError::query(NO_DATA));
        }

        let rows: Vec<SqliteRow> = bind_params(sqlx::query(sql), params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| NodeError::query(format_query_error(e)))?;

        // Without rows there is nothing to key by column name.
        let columns: Vec<String> = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|col| col.name().to_string())
                    .collect()
            })
            .unwrap_or_default();

        let rows: Vec<Row> = rows.iter().map(convert_row).collect();

        Ok(QueryResult::with_data(columns, rows))
    }

    async fn run(&self, sql: &str, params: &[Value]) -> Result<MutationResult> {
        let result = bind_params(sqlx::query(sql), params)
            .execute(&self.pool)
            .await
            .map_err(|e| NodeError::query(format_query_error(e)))?;

        Ok(MutationResult::from_engine(
            result.rows_affected(),
            result.last_insert_rowid(),
        ))
    }

    async fn exec(&self, sql: &str) -> Result<()> {
        sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .map_err(|e| NodeError::query(format_query_error(e)))?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Opens [`SqliteClient`] handles using the execution settings.
#[derive(Debug, Clone, Default)]
pub struct SqliteConnector {
    config: ExecutionConfig,
}

impl SqliteConnector {
    /// Creates a connector with the given execution settings.
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    async fn open(&self, path: &str, max_connections: u32) -> Result<Box<dyn DatabaseClient>> {
        let client = SqliteClient::open(path, &self.config, max_connections).await?;
        Ok(Box::new(client))
    }
}

/// Builds connect options for a database path.
fn connect_options(path: &str, config: &ExecutionConfig) -> Result<SqliteConnectOptions> {
    let options = if is_memory_path(path) {
        SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| NodeError::query(format!("Invalid database path: {e}")))?
    } else {
        SqliteConnectOptions::new().filename(path)
    };

    Ok(options
        .create_if_missing(config.create_if_missing)
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms)))
}

/// Binds positional parameters in order.
fn bind_params<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [Value],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    params.iter().fold(query, |query, param| match param {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::String(s) => query.bind(s.as_str()),
        Value::Bytes(b) => query.bind(b.as_slice()),
    })
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    (0..row.columns().len())
        .map(|i| convert_value(row, i))
        .collect()
}

/// Converts a single column value from a SqliteRow to our Value type.
///
/// SQLite is dynamically typed, so the storage class of the value itself
/// decides the conversion, not the declared column type.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let type_name = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_uppercase(),
        Err(_) => return Value::Null,
    };

    match type_name.as_str() {
        "INTEGER" | "BIGINT" | "INT8" | "BOOLEAN" => row
            .try_get::<i64, _>(index)
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => row
            .try_get::<f64, _>(index)
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "BLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        // TEXT and anything else; fall back to raw bytes for invalid UTF-8
        _ => row
            .try_get::<String, _>(index)
            .map(Value::String)
            .or_else(|_| row.try_get::<Vec<u8>, _>(index).map(Value::Bytes))
            .unwrap_or(Value::Null),
    }
}

/// Extracts the engine message from a sqlx error.
fn format_query_error(error: sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => {
            if let Some(code) = db_error.code() {
                debug!("SQLite error code {}: {}", code, db_error.message());
            }
            db_error.message().to_string()
        }
        None => error.to_string(),
    }
}
