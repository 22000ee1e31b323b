//! Collects outcomes and applies the empty-result fallback policy.

use crate::graph::GraphStore;
use crate::models::ExecutionOutcome;
use crate::pipeline::executor::{execute_batch, NoopObserver};
use crate::pipeline::phrases::fallback_statement;
use std::time::Duration;
use tracing::{info, warn};

/// Returned instead of a narrative when a batch yields no data.
pub const NO_DATA_MESSAGE: &str = "No data was retrieved from the Graph database. \
Please ensure that the pushToNeo4j endpoint has been triggered to sync data from Azure AD.";

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub outcomes: Vec<ExecutionOutcome>,
    pub fallback_used: bool,
    /// True when no outcome, fallback included, carries data.
    pub no_data: bool,
}

pub fn has_data(outcomes: &[ExecutionOutcome]) -> bool {
    outcomes.iter().any(ExecutionOutcome::has_data)
}

/// Apply the fallback policy to a finished batch.
///
/// When nothing returned data and the request reads "list all <entity>",
/// the default entity query runs once. Its outcome is appended only when
/// it has records; a failing fallback counts as empty.
pub async fn aggregate(
    store: &dyn GraphStore,
    statement_timeout: Duration,
    request_text: &str,
    mut outcomes: Vec<ExecutionOutcome>,
) -> Aggregation {
    let mut fallback_used = false;

    if !has_data(&outcomes) {
        if let Some(statement) = fallback_statement(request_text) {
            info!("No data from generated statements, running fallback: {}", statement);
            let fallback = execute_batch(
                store,
                &[statement.to_string()],
                statement_timeout,
                &mut NoopObserver,
            )
            .await;

            match fallback.into_iter().next() {
                Some(outcome) if outcome.has_data() => {
                    outcomes.push(outcome);
                    fallback_used = true;
                }
                Some(outcome) => match outcome.error() {
                    Some(error) => warn!("Fallback query failed: {}", error),
                    None => info!("Fallback query returned no records"),
                },
                None => {}
            }
        }
    }

    let no_data = !has_data(&outcomes);
    if no_data {
        warn!("Batch produced no data");
    }

    Aggregation {
        outcomes,
        fallback_used,
        no_data,
    }
}
