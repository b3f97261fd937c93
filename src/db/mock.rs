//! Mock database client for testing.
//!
//! Records every call instead of touching SQLite, and counts how often
//! handles are opened and closed.

use super::{Connector, DatabaseClient, MutationResult, QueryResult, Value};
use crate::error::{NodeError, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

/// A call made against a mock handle.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    FetchAll { sql: String, params: Vec<Value> },
    Run { sql: String, params: Vec<Value> },
    Exec { sql: String },
}

/// State shared between a [`MockConnector`] and the handles it opens.
#[derive(Debug, Default)]
pub struct MockState {
    /// Number of handles opened.
    pub opened: usize,
    /// Number of `close` calls received.
    pub closed: usize,
    /// Calls received, in order.
    pub calls: Vec<MockCall>,
    /// Paths passed to `open`.
    pub paths: Vec<String>,
}

/// A mock database client that returns predefined results.
///
/// `fetch_all` answers with a single row echoing the SQL and parameters,
/// `run` reports one changed row with rowid 1.
#[derive(Debug, Clone, Default)]
pub struct MockDatabaseClient {
    state: Arc<Mutex<MockState>>,
    fail_on: Option<String>,
}

impl MockDatabaseClient {
    /// Creates a new mock database client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every statement containing `needle` fail with a query error.
    pub fn failing_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on = Some(needle.into());
        self
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self, sql: &str) -> Result<()> {
        match &self.fail_on {
            Some(needle) if sql.contains(needle.as_str()) => {
                Err(NodeError::query(format!("mock failure near \"{needle}\"")))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        self.state().calls.push(MockCall::FetchAll {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        self.check(sql)?;

        let mut columns = vec!["sql".to_string()];
        let mut row = vec![Value::from(sql)];
        for (i, param) in params.iter().enumerate() {
            columns.push(format!("p{}", i + 1));
            row.push(param.clone());
        }

        Ok(QueryResult::with_data(columns, vec![row]))
    }

    async fn run(&self, sql: &str, params: &[Value]) -> Result<MutationResult> {
        self.state().calls.push(MockCall::Run {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        self.check(sql)?;

        Ok(MutationResult::from_engine(1, 1))
    }

    async fn exec(&self, sql: &str) -> Result<()> {
        self.state().calls.push(MockCall::Exec {
            sql: sql.to_string(),
        });
        self.check(sql)
    }

    async fn close(&self) -> Result<()> {
        self.state().closed += 1;
        Ok(())
    }
}

/// Hands out [`MockDatabaseClient`] handles sharing one [`MockState`].
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    client: MockDatabaseClient,
}

impl MockConnector {
    /// Creates a connector whose handles always succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a connector whose handles fail on statements containing `needle`.
    pub fn failing_on(needle: impl Into<String>) -> Self {
        Self {
            client: MockDatabaseClient::new().failing_on(needle),
        }
    }

    /// Returns a snapshot of the opens, closes and calls recorded so far.
    pub fn snapshot(&self) -> MockState {
        let state = self.client.state();
        MockState {
            opened: state.opened,
            closed: state.closed,
            calls: state.calls.clone(),
            paths: state.paths.clone(),
        }
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(&self, path: &str, _max_connections: u32) -> Result<Box<dyn DatabaseClient>> {
        {
            let mut state = self.client.state();
            state.opened += 1;
            state.paths.push(path.to_string());
        }
        Ok(Box::new(self.client.clone()))
    }
}
