//! Single-request execution against SQLite files.

use super::{run_payloads, TestDb};
use pretty_assertions::assert_eq;
use serde_json::json;
use sqlite_node::config::ExecutionConfig;
use sqlite_node::db::SqliteConnector;
use sqlite_node::query::{ExecutionResult, QueryExecutor};
use sqlite_node::{NodeError, QueryType, Request};

#[tokio::test]
async fn test_create_insert_select_roundtrip() {
    let db = TestDb::new();

    let payloads = run_payloads(&[
        db.request("CREATE TABLE t (id INTEGER, name TEXT)"),
        db.request("INSERT INTO t VALUES ($id, $name)")
            .with_args(r#"{"$id": 1, "$name": "first"}"#),
        db.request("SELECT * FROM t WHERE id = $id").with_args(r#"{"$id": 1}"#),
    ])
    .await;

    assert_eq!(
        payloads,
        vec![
            json!({"message": "Query executed successfully."}),
            json!({"changes": 1, "last_id": 1}),
            json!([{"id": 1, "name": "first"}]),
        ]
    );
}

#[tokio::test]
async fn test_unused_arguments_are_dropped() {
    let db = TestDb::new();

    let payloads = run_payloads(&[
        db.request("CREATE TABLE t (id INTEGER)"),
        db.request("INSERT INTO t VALUES ($id)")
            .with_args(r#"{"$id": 7, "$other": "ignored"}"#),
        db.request("SELECT id FROM t"),
    ])
    .await;

    assert_eq!(payloads[2], json!([{"id": 7}]));
}

#[tokio::test]
async fn test_update_and_delete_report_changes() {
    let db = TestDb::new();

    let payloads = run_payloads(&[
        db.request("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)"),
        db.request("INSERT INTO t (v) VALUES ('a')"),
        db.request("INSERT INTO t (v) VALUES ('b')"),
        db.request("UPDATE t SET v = $v").with_args(r#"{"$v": "z"}"#),
        db.request("DELETE FROM t WHERE id = $id").with_args(r#"{"$id": 2}"#),
    ])
    .await;

    assert_eq!(payloads[2], json!({"changes": 1, "last_id": 2}));
    assert_eq!(payloads[3]["changes"], json!(2));
    assert_eq!(payloads[4]["changes"], json!(1));
}

#[tokio::test]
async fn test_split_select_spread() {
    let db = TestDb::new();

    let payloads = run_payloads(&[
        db.request("CREATE TABLE a (x INTEGER); CREATE TABLE b (y TEXT);"),
        db.request("INSERT INTO a VALUES (1), (2)"),
        db.request("INSERT INTO b VALUES ('only')"),
        db.request("SELECT x FROM a ORDER BY x; SELECT y FROM b; SELECT x FROM a WHERE x > $min")
            .with_type(QueryType::Select)
            .with_args(r#"{"$min": 5}"#)
            .with_spread(true),
    ])
    .await;

    assert_eq!(
        payloads[3..].to_vec(),
        vec![
            json!({"items": [{"x": 1}, {"x": 2}]}),
            json!({"items": [{"y": "only"}]}),
            json!({"items": []}),
        ]
    );
}

#[tokio::test]
async fn test_split_select_without_spread_nests_results() {
    let db = TestDb::new();

    let payloads = run_payloads(&[
        db.request("CREATE TABLE t (x INTEGER)"),
        db.request("INSERT INTO t VALUES (3)"),
        db.request("SELECT x FROM t; SELECT count(*) AS n FROM t"),
    ])
    .await;

    assert_eq!(payloads[2], json!([[{"x": 3}], [{"n": 1}]]));
}

#[tokio::test]
async fn test_single_select_spread_emits_rows() {
    let db = TestDb::new();

    let payloads = run_payloads(&[
        db.request("CREATE TABLE t (x INTEGER)"),
        db.request("INSERT INTO t VALUES (1), (2), (3)"),
        db.request("SELECT x FROM t ORDER BY x").with_spread(true),
    ])
    .await;

    assert_eq!(
        payloads[2..].to_vec(),
        vec![json!({"x": 1}), json!({"x": 2}), json!({"x": 3})]
    );
}

#[tokio::test]
async fn test_values_keep_their_types() {
    let db = TestDb::new();

    let payloads = run_payloads(&[db
        .request("SELECT $i AS i, $f AS f, $s AS s, $b AS b, $n AS n, $o AS o")
        .with_args(r#"{"$i": 42, "$f": 1.5, "$s": "text", "$b": true, "$n": null, "$o": {"k": [1]}}"#)])
    .await;

    assert_eq!(
        payloads[0],
        json!([{"i": 42, "f": 1.5, "s": "text", "b": 1, "n": null, "o": "{\"k\":[1]}"}])
    );
}

#[tokio::test]
async fn test_placeholders_in_literals_are_left_alone() {
    let db = TestDb::new();

    let payloads = run_payloads(&[db
        .request("SELECT '$id' AS literal, $id AS bound")
        .with_args(r#"{"$id": 9}"#)])
    .await;

    assert_eq!(payloads[0], json!([{"literal": "@id", "bound": 9}]));
}

#[tokio::test]
async fn test_engine_error_is_query_execution() {
    let db = TestDb::new();
    let config = ExecutionConfig::default();
    let connector = SqliteConnector::new(config.clone());
    let executor = QueryExecutor::new(&connector, &config);

    let err = executor
        .execute(&db.request("SELECT * FROM missing"))
        .await
        .unwrap_err();

    assert!(matches!(err, NodeError::QueryExecution(_)));
    assert!(err.message().contains("no such table: missing"));
}

#[tokio::test]
async fn test_missing_parameter_is_query_execution() {
    let db = TestDb::new();
    let config = ExecutionConfig::default();
    let connector = SqliteConnector::new(config.clone());
    let executor = QueryExecutor::new(&connector, &config);

    let err = executor
        .execute(&db.request("SELECT $absent AS a"))
        .await
        .unwrap_err();

    assert!(matches!(err, NodeError::QueryExecution(_)));
    assert!(err.message().contains("absent"));
}

#[tokio::test]
async fn test_memory_database() {
    let config = ExecutionConfig::default();
    let connector = SqliteConnector::new(config.clone());
    let executor = QueryExecutor::new(&connector, &config);

    let execution = executor
        .execute(&Request::new(":memory:", "SELECT 1 AS a; SELECT 2 AS b"))
        .await
        .unwrap();

    assert_eq!(execution.query_type, QueryType::Select);
    assert!(matches!(execution.result, ExecutionResult::Batches(_)));
    assert_eq!(execution.result.to_json(), json!([[{"a": 1}], [{"b": 2}]]));
}

#[tokio::test]
async fn test_many_concurrent_selects_on_file() {
    let db = TestDb::new();

    let mut setup = vec![db.request("CREATE TABLE t (x INTEGER)")];
    setup.extend((0..10).map(|i| db.request(&format!("INSERT INTO t VALUES ({i})"))));
    run_payloads(&setup).await;

    let query = (0..10)
        .map(|i| format!("SELECT x FROM t WHERE x = {i}"))
        .collect::<Vec<_>>()
        .join("; ");
    let payloads = run_payloads(&[db.request(&query)]).await;

    let expected: Vec<_> = (0..10).map(|i| json!([{"x": i}])).collect();
    assert_eq!(payloads[0], serde_json::Value::Array(expected));
}

#[tokio::test]
async fn test_select_mixed_with_write_is_rejected() {
    let db = TestDb::new();
    run_payloads(&[
        db.request("CREATE TABLE t (x INTEGER)"),
        db.request("INSERT INTO t VALUES (1)"),
    ])
    .await;

    let config = ExecutionConfig::default();
    let connector = SqliteConnector::new(config.clone());
    let executor = QueryExecutor::new(&connector, &config);

    let err = executor
        .execute(&db.request("SELECT 1 AS a; INSERT INTO t VALUES (9)"))
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::QueryExecution(_)));
    assert_eq!(err.message(), "This statement does not return data");

    let payloads = run_payloads(&[db.request("SELECT x FROM t")]).await;
    assert_eq!(payloads[0], json!([{"x": 1}]));
}

#[tokio::test]
async fn test_mutation_with_several_statements_is_rejected() {
    let db = TestDb::new();
    run_payloads(&[db.request("CREATE TABLE t (x INTEGER)")]).await;

    let config = ExecutionConfig::default();
    let connector = SqliteConnector::new(config.clone());
    let executor = QueryExecutor::new(&connector, &config);

    let err = executor
        .execute(&db.request("INSERT INTO t VALUES (2); INSERT INTO t VALUES (3)"))
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::QueryExecution(_)));
    assert!(err.message().contains("more than one statement"));

    let payloads = run_payloads(&[
        db.request("INSERT INTO t VALUES ('a;b')"),
        db.request("SELECT x FROM t"),
    ])
    .await;
    assert_eq!(payloads[0], json!({"changes": 1, "last_id": 1}));
    assert_eq!(payloads[1], json!([{"x": "a;b"}]));
}
