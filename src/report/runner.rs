//! Runs the fixed battery of report sections.

use crate::graph::GraphStore;
use crate::models::{FullReport, ReportSection};
use crate::pipeline::executor::{execute_batch, NoopObserver};
use crate::report::sections::all_sections;
use chrono::Utc;
use std::time::Duration;
use tracing::{info, warn};

/// Execute every section statement and pair it with its narrative.
///
/// A failed section keeps its place with an empty result and the error
/// text, so the section count never changes.
pub async fn run_report(
    store: &dyn GraphStore,
    statement_timeout: Duration,
    session_id: &str,
) -> FullReport {
    let templates: Vec<_> = all_sections().collect();
    let statements: Vec<String> = templates.iter().map(|t| t.statement.to_string()).collect();

    info!("Running full report ({} sections)", templates.len());
    let outcomes = execute_batch(store, &statements, statement_timeout, &mut NoopObserver).await;

    let sections: Vec<ReportSection> = templates
        .into_iter()
        .zip(outcomes)
        .map(|(template, outcome)| {
            if let Some(error) = outcome.error() {
                warn!("Report section '{}' failed: {}", template.title, error);
            }
            ReportSection {
                title: template.title.to_string(),
                description: template.description.to_string(),
                insight: template.insight.to_string(),
                recommendation: template.recommendation.to_string(),
                outcome,
            }
        })
        .collect();

    FullReport {
        session_id: session_id.to_string(),
        generated_at: Utc::now(),
        sections,
    }
}
