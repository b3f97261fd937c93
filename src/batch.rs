//! Batch processing.
//!
//! Requests run one after another, in order. A failed request either turns
//! into an inline error record or aborts the batch, depending on the
//! [`FailurePolicy`].

use tracing::{info, warn};

use crate::config::{BatchConfig, ExecutionConfig};
use crate::db::Connector;
use crate::error::Result;
use crate::output::{shape, OutputRecord};
use crate::query::{QueryExecutor, Request};

/// How a batch reacts to a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the batch with an error carrying the failing index.
    #[default]
    FailFast,
    /// Emit `{"error": message}` for the failing request and carry on.
    ContinueOnFail,
}

impl From<&BatchConfig> for FailurePolicy {
    fn from(config: &BatchConfig) -> Self {
        if config.continue_on_fail {
            Self::ContinueOnFail
        } else {
            Self::FailFast
        }
    }
}

/// Runs batches of requests.
pub struct BatchRunner<'a> {
    executor: QueryExecutor<'a>,
    policy: FailurePolicy,
}

impl<'a> BatchRunner<'a> {
    /// Creates a runner that opens databases through `connector`.
    pub fn new(
        connector: &'a dyn Connector,
        config: &'a ExecutionConfig,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            executor: QueryExecutor::new(connector, config),
            policy,
        }
    }

    /// Processes every request and collects the output records.
    ///
    /// Records of one request are contiguous and in request order. A failed
    /// request contributes no partial output.
    pub async fn run(&self, requests: &[Request]) -> Result<Vec<OutputRecord>> {
        let mut records = Vec::with_capacity(requests.len());

        for (index, request) in requests.iter().enumerate() {
            match self.executor.execute(request).await {
                Ok(execution) => {
                    let shaped = shape(execution.query_type, request.spread, &execution.result);
                    records.extend(
                        shaped
                            .into_iter()
                            .map(|json| OutputRecord::new(json, index)),
                    );
                }
                Err(e) => match self.policy {
                    FailurePolicy::ContinueOnFail => {
                        warn!("Request {} failed: {}", index, e);
                        records.push(OutputRecord::error(&e.message(), index));
                    }
                    FailurePolicy::FailFast => return Err(e.with_item_index(index)),
                },
            }
        }

        info!(
            "Processed {} request(s) into {} record(s)",
            requests.len(),
            records.len()
        );
        Ok(records)
    }
}
