//! Request execution.
//!
//! Turns a [`Request`] into an [`Execution`]: validate, classify, bind, then
//! run the statements on a database handle that is opened for this request
//! only and closed before returning, whatever the outcome.

use futures::future::try_join_all;
use serde_json::json;
use tracing::{debug, info, warn};

use super::arguments::{self, Arguments, BoundStatement};
use super::classifier::{classify, count_statements, split_statements};
use super::{QueryType, Request};
use crate::config::ExecutionConfig;
use crate::db::{Connector, DatabaseClient, MutationResult, QueryResult};
use crate::error::{NodeError, Result};

/// Message reported for raw statement execution.
pub const STATUS_MESSAGE: &str = "Query executed successfully.";

/// Error for INSERT, UPDATE or DELETE text holding several statements.
const MULTIPLE_STATEMENTS: &str = "The supplied SQL string contains more than one statement";

/// Executes requests against databases opened through a [`Connector`].
pub struct QueryExecutor<'a> {
    connector: &'a dyn Connector,
    config: &'a ExecutionConfig,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new query executor.
    pub fn new(connector: &'a dyn Connector, config: &'a ExecutionConfig) -> Self {
        Self { connector, config }
    }

    /// Runs one request end to end.
    ///
    /// Invalid requests, unparseable arguments and missing placeholders are
    /// rejected before any database handle is opened.
    pub async fn execute(&self, request: &Request) -> Result<Execution> {
        validate(request)?;

        let query_type = classify(request.query_type, &request.query);
        let args = arguments::parse_arguments(&request.args)?;
        let plan = Plan::build(query_type, &request.query, &args)?;

        info!(
            "Executing {} query against {} ({} statement(s))",
            query_type,
            request.database_path,
            plan.statement_count()
        );

        let db = self
            .connector
            .open(&request.database_path, plan.connections_wanted(self.config))
            .await?;

        let outcome = plan.run(db.as_ref()).await;
        let closed = db.close().await;

        let result = outcome?;
        if let Err(e) = closed {
            warn!("Failed to close {}: {}", request.database_path, e);
            return Err(e);
        }

        Ok(Execution { query_type, result })
    }
}

/// Rejects requests that cannot be executed at all.
fn validate(request: &Request) -> Result<()> {
    if request.database_path.trim().is_empty() {
        return Err(NodeError::invalid_request("No database path provided."));
    }
    if request.query.trim().is_empty() {
        return Err(NodeError::invalid_request("No query provided."));
    }
    Ok(())
}

/// What will be sent to the database for one request.
#[derive(Debug, Clone, PartialEq)]
enum Plan {
    /// One or more row-fetching statements, results kept apart when split.
    Select {
        statements: Vec<BoundStatement>,
        split: bool,
    },
    /// A single data-modifying statement.
    Mutation(BoundStatement),
    /// Unbound SQL run as-is.
    Raw(String),
}

impl Plan {
    fn build(query_type: QueryType, query: &str, args: &Arguments) -> Result<Self> {
        let query = arguments::translate_query(query);

        let prepare = |statement: &str| {
            let args = arguments::normalize(args, statement);
            arguments::bind(statement, &args)
        };

        match query_type {
            QueryType::Select => {
                let fragments = split_statements(&query);
                if fragments.len() > 1 {
                    let statements = fragments
                        .into_iter()
                        .map(prepare)
                        .collect::<Result<Vec<_>>>()?;
                    Ok(Self::Select {
                        statements,
                        split: true,
                    })
                } else {
                    Ok(Self::Select {
                        statements: vec![prepare(&query)?],
                        split: false,
                    })
                }
            }
            t if t.is_mutation() => {
                if count_statements(&query) > 1 {
                    return Err(NodeError::query(MULTIPLE_STATEMENTS));
                }
                Ok(Self::Mutation(prepare(&query)?))
            }
            _ => Ok(Self::Raw(query)),
        }
    }

    fn statement_count(&self) -> usize {
        match self {
            Self::Select { statements, .. } => statements.len(),
            Self::Mutation(_) | Self::Raw(_) => 1,
        }
    }

    fn connections_wanted(&self, config: &ExecutionConfig) -> u32 {
        let wanted = u32::try_from(self.statement_count()).unwrap_or(u32::MAX);
        wanted.clamp(1, config.max_concurrent_statements.max(1))
    }

    async fn run(&self, db: &dyn DatabaseClient) -> Result<ExecutionResult> {
        match self {
            Self::Select {
                statements,
                split: false,
            } => {
                let statement = &statements[0];
                debug!("Fetching rows: {}", statement.sql);
                let rows = db.fetch_all(&statement.sql, &statement.params).await?;
                Ok(ExecutionResult::Rows(rows))
            }
            Self::Select {
                statements,
                split: true,
            } => {
                // Read-only and independent, so they may run concurrently;
                // try_join_all keeps the textual order of the results.
                let batches = try_join_all(statements.iter().map(|statement| {
                    debug!("Fetching rows: {}", statement.sql);
                    db.fetch_all(&statement.sql, &statement.params)
                }))
                .await?;
                Ok(ExecutionResult::Batches(batches))
            }
            Self::Mutation(statement) => {
                debug!("Running mutation: {}", statement.sql);
                let result = db.run(&statement.sql, &statement.params).await?;
                Ok(ExecutionResult::Mutation(result))
            }
            Self::Raw(sql) => {
                debug!("Executing raw statement: {}", sql);
                db.exec(sql).await?;
                Ok(ExecutionResult::Status {
                    message: STATUS_MESSAGE.to_string(),
                })
            }
        }
    }
}

/// Result of executing one request.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// Rows of a single SELECT.
    Rows(QueryResult),
    /// Rows of each statement of a split SELECT, in textual order.
    Batches(Vec<QueryResult>),
    /// Outcome of an INSERT, UPDATE or DELETE.
    Mutation(MutationResult),
    /// Fixed status for raw statement execution.
    Status { message: String },
}

impl ExecutionResult {
    /// Converts the result into its JSON output form.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Rows(rows) => serde_json::Value::Array(rows.to_json_rows()),
            Self::Batches(batches) => serde_json::Value::Array(
                batches
                    .iter()
                    .map(|rows| serde_json::Value::Array(rows.to_json_rows()))
                    .collect(),
            ),
            Self::Mutation(result) => json!({
                "changes": result.changes,
                "last_id": result.last_id,
            }),
            Self::Status { message } => json!({ "message": message }),
        }
    }
}

/// Successful request execution outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// The resolved query type.
    pub query_type: QueryType,
    /// What the database returned.
    pub result: ExecutionResult,
}
