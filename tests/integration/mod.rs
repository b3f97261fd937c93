//! Integration tests for sqlite-node.

pub mod batch_test;
pub mod pipeline_test;

use sqlite_node::config::ExecutionConfig;
use sqlite_node::db::SqliteConnector;
use sqlite_node::{BatchRunner, FailurePolicy, OutputRecord, Request, Result};
use tempfile::TempDir;

/// A scratch directory holding one database file.
pub struct TestDb {
    _dir: TempDir,
    pub path: String,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.db").to_str().unwrap().to_string();
        Self { _dir: dir, path }
    }

    pub fn request(&self, query: &str) -> Request {
        Request::new(self.path.as_str(), query)
    }
}

/// Runs a batch against real SQLite with default execution settings.
pub async fn run_batch(requests: &[Request], policy: FailurePolicy) -> Result<Vec<OutputRecord>> {
    let config = ExecutionConfig::default();
    let connector = SqliteConnector::new(config.clone());
    BatchRunner::new(&connector, &config, policy)
        .run(requests)
        .await
}

/// Runs a batch and returns only the record payloads.
pub async fn run_payloads(requests: &[Request]) -> Vec<serde_json::Value> {
    run_batch(requests, FailurePolicy::FailFast)
        .await
        .unwrap()
        .into_iter()
        .map(|record| record.json)
        .collect()
}
