//! Batch failure policies against SQLite files.

use super::{run_batch, TestDb};
use pretty_assertions::assert_eq;
use serde_json::json;
use sqlite_node::{FailurePolicy, NodeError};

#[tokio::test]
async fn test_continue_on_fail_keeps_going() {
    let db = TestDb::new();

    let records = run_batch(
        &[
            db.request("CREATE TABLE t (x INTEGER)"),
            db.request("INSERT INTO missing VALUES (1)"),
            db.request("INSERT INTO t VALUES (1)"),
            db.request("SELECT x FROM t").with_args("not json"),
        ],
        FailurePolicy::ContinueOnFail,
    )
    .await
    .unwrap();

    assert_eq!(records.len(), 4);
    assert_eq!(records[1].error_message(), Some("no such table: missing"));
    assert_eq!(records[1].source_index, Some(1));
    assert_eq!(records[2].json, json!({"changes": 1, "last_id": 1}));
    assert!(records[3].error_message().is_some());
    assert_eq!(records[3].source_index, Some(3));
}

#[tokio::test]
async fn test_fail_fast_stops_at_first_failure() {
    let db = TestDb::new();

    let err = run_batch(
        &[
            db.request("CREATE TABLE t (x INTEGER)"),
            db.request("UPDATE missing SET x = 1"),
            db.request("INSERT INTO t VALUES (1)"),
        ],
        FailurePolicy::FailFast,
    )
    .await
    .unwrap_err();

    assert_eq!(err.item_index(), Some(1));
    assert!(err.to_string().starts_with("Item 1: "));

    // the insert after the failure never ran
    let records = run_batch(&[db.request("SELECT count(*) AS n FROM t")], FailurePolicy::FailFast)
        .await
        .unwrap();
    assert_eq!(records[0].json, json!([{"n": 0}]));
}

#[tokio::test]
async fn test_fail_fast_on_invalid_request() {
    let err = run_batch(
        &[sqlite_node::Request::new("  ", "SELECT 1")],
        FailurePolicy::FailFast,
    )
    .await
    .unwrap_err();

    assert_eq!(err.item_index(), Some(0));
    match err {
        NodeError::Item { source, .. } => {
            assert!(matches!(*source, NodeError::InvalidRequest(_)))
        }
        other => panic!("Expected Item error, got {other:?}"),
    }
}
