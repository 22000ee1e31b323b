//! The statement pipeline.
//!
//! Generation -> splitting -> sequential execution (with directory
//! mirroring after each statement) -> aggregation -> narrative.
//! Only a generation failure aborts a run; every other failure is
//! recorded in the response.

pub mod aggregator;
pub mod classifier;
pub mod executor;
pub mod mirror;
pub mod phrases;
pub mod splitter;

use crate::config::{Config, ModelConfig};
use crate::directory::DirectoryService;
use crate::error::{GenerationError, PipelineError};
use crate::graph::GraphStore;
use crate::llm::{self, ChatModel};
use crate::models::{BatchRequest, BatchResponse, FullReport, RequestMode};
use crate::progress::{ProgressSink, Stage};
use crate::report;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use aggregator::{aggregate, NO_DATA_MESSAGE};
use executor::execute_batch;
use mirror::SyncMirror;
use splitter::split_statements;

/// What a request produced.
#[derive(Debug, Clone)]
pub enum PipelineOutput {
    Batch(BatchResponse),
    Report(FullReport),
}

/// Owns the collaborators a request needs. Cheap to share behind `Arc`.
pub struct Pipeline {
    store: Arc<dyn GraphStore>,
    directory: Arc<dyn DirectoryService>,
    model: Arc<dyn ChatModel>,
    model_config: ModelConfig,
    statement_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn GraphStore>,
        directory: Arc<dyn DirectoryService>,
        model: Arc<dyn ChatModel>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            directory,
            model,
            model_config: config.model.clone(),
            statement_timeout: config.graph.statement_timeout(),
        }
    }

    /// Run the full report when asked for (or when the request text names
    /// it), otherwise a batch.
    pub async fn handle(
        &self,
        request: &BatchRequest,
        force_report: bool,
        progress: &ProgressSink,
    ) -> Result<PipelineOutput, PipelineError> {
        if force_report || phrases::is_report_request(&request.request) {
            info!("Request matched the full report");
            let report = self.run_full_report(&request.session_id, progress).await;
            return Ok(PipelineOutput::Report(report));
        }

        self.run_batch(request, progress)
            .await
            .map(PipelineOutput::Batch)
    }

    /// Generate, execute, mirror and summarize one request.
    pub async fn run_batch(
        &self,
        request: &BatchRequest,
        progress: &ProgressSink,
    ) -> Result<BatchResponse, PipelineError> {
        info!("Running {} request: {}", request.mode, request.request);

        progress.emit(Stage::Generating);
        let mut generated =
            match llm::generate_statements(self.model.as_ref(), &self.model_config, request).await {
                Ok(text) => text,
                Err(e) => {
                    error!("Statement generation failed: {}", e);
                    progress.emit(Stage::Failed);
                    return Err(e.into());
                }
            };

        if request.mode == RequestMode::Query && self.model_config.validate_statements {
            progress.emit(Stage::Validating);
            generated =
                llm::validate_statements(self.model.as_ref(), &self.model_config, &generated).await;
        }

        let statements = split_statements(&generated);
        if statements.is_empty() {
            error!("Model reply contained no statements");
            progress.emit(Stage::Failed);
            let e = GenerationError::Malformed("reply contained no statements".to_string());
            return Err(e.into());
        }
        info!("{} statement(s) to execute", statements.len());

        progress.emit(Stage::Executing);
        let mut mirror = SyncMirror::new(self.directory.clone(), progress.clone());
        let outcomes = execute_batch(
            self.store.as_ref(),
            &statements,
            self.statement_timeout,
            &mut mirror,
        )
        .await;
        let sync = mirror.into_attempts();

        let (outcomes, fallback_used, no_data) = match request.mode {
            RequestMode::Query => {
                let aggregation = aggregate(
                    self.store.as_ref(),
                    self.statement_timeout,
                    &request.request,
                    outcomes,
                )
                .await;
                (
                    aggregation.outcomes,
                    aggregation.fallback_used,
                    aggregation.no_data,
                )
            }
            RequestMode::Action => (outcomes, false, false),
        };

        let (narrative, history) = if no_data {
            (NO_DATA_MESSAGE.to_string(), None)
        } else {
            progress.emit(Stage::Refining);
            let narrative =
                llm::refine_results(self.model.as_ref(), &self.model_config, request, &outcomes)
                    .await;

            progress.emit(Stage::SummarizingHistory);
            let history = llm::compress_history(
                self.model.as_ref(),
                &self.model_config,
                request.history.as_deref(),
                &narrative,
            )
            .await;
            (narrative, Some(history))
        };

        progress.emit(Stage::Completed);

        Ok(BatchResponse {
            session_id: request.session_id.clone(),
            mode: request.mode,
            statements,
            outcomes,
            sync,
            narrative,
            history,
            fallback_used,
            no_data,
        })
    }

    /// Run every report section.
    pub async fn run_full_report(&self, session_id: &str, progress: &ProgressSink) -> FullReport {
        progress.emit(Stage::Executing);
        let report = report::run_report(self.store.as_ref(), self.statement_timeout, session_id).await;
        progress.emit(Stage::Completed);
        report
    }
}
