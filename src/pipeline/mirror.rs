//! Mirrors identity relationship mutations to the directory service.
//!
//! Mirroring is best-effort. A failed directory call never rolls back the
//! graph mutation and never stops the batch; it is logged with enough
//! detail to reconcile by hand and recorded in the sync ledger.

use crate::directory::DirectoryService;
use crate::graph::ResultRecord;
use crate::models::{
    DirectoryCall, ExecutionOutcome, MutationIntent, SyncAttempt, SyncOperation, SyncStatus,
};
use crate::pipeline::classifier::{classify, is_mutation};
use crate::pipeline::executor::OutcomeObserver;
use crate::pipeline::splitter::strip_comment_lines;
use crate::progress::{ProgressSink, Stage};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Field names checked, in order, for each identifier.
const PRINCIPAL_FIELDS: &[(&str, &str)] = &[("u", "id")];
const PRINCIPAL_FLAT_FIELDS: &[&str] = &["userId"];
const GROUP_FIELDS: &[(&str, &str)] = &[("g", "id")];
const GROUP_FLAT_FIELDS: &[&str] = &["groupId"];
const ROLE_FIELDS: &[(&str, &str)] = &[("r", "id")];
const ROLE_FLAT_FIELDS: &[&str] = &["roleId", "roleDefinitionId"];

/// Build the operations a classified statement's records imply.
///
/// Records lacking either identifier are skipped.
pub fn plan_operations(intent: MutationIntent, records: &[ResultRecord]) -> Vec<SyncOperation> {
    let call = match DirectoryCall::for_intent(intent) {
        Some(call) => call,
        None => return Vec::new(),
    };

    let (target_nested, target_flat) = if call.targets_group() {
        (GROUP_FIELDS, GROUP_FLAT_FIELDS)
    } else {
        (ROLE_FIELDS, ROLE_FLAT_FIELDS)
    };

    records
        .iter()
        .filter_map(|record| {
            let principal_id = extract_id(record, PRINCIPAL_FIELDS, PRINCIPAL_FLAT_FIELDS);
            let target_id = extract_id(record, target_nested, target_flat);
            match (principal_id, target_id) {
                (Some(principal_id), Some(target_id)) => Some(SyncOperation {
                    intent,
                    call,
                    principal_id,
                    target_id,
                }),
                (principal_id, target_id) => {
                    debug!(
                        "Skipping record for {}: user={:?} target={:?}",
                        intent, principal_id, target_id
                    );
                    None
                }
            }
        })
        .collect()
}

fn extract_id(record: &ResultRecord, nested: &[(&str, &str)], flat: &[&str]) -> Option<String> {
    nested
        .iter()
        .find_map(|(entity, field)| record.get(*entity).and_then(|e| e.get(*field)).and_then(id_text))
        .or_else(|| flat.iter().find_map(|field| record.get(*field).and_then(id_text)))
}

/// Identifier text from a string or integer value; blanks count as missing.
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

/// Outcome observer that issues directory calls after each statement.
pub struct SyncMirror {
    directory: Arc<dyn DirectoryService>,
    progress: ProgressSink,
    attempts: Vec<SyncAttempt>,
}

impl SyncMirror {
    pub fn new(directory: Arc<dyn DirectoryService>, progress: ProgressSink) -> Self {
        Self {
            directory,
            progress,
            attempts: Vec::new(),
        }
    }

    /// The sync ledger, in the order calls were issued.
    pub fn into_attempts(self) -> Vec<SyncAttempt> {
        self.attempts
    }

    async fn deliver(&mut self, index: usize, statement: &str, operation: SyncOperation) {
        info!(
            "Mirroring statement {} as {}: {} user={} target={}",
            index + 1,
            operation.intent,
            operation.call,
            operation.principal_id,
            operation.target_id
        );

        let status = match self.directory.send(&operation).await {
            Ok(Some(code)) => SyncStatus::Delivered { code },
            Ok(None) => SyncStatus::Skipped,
            Err(e) => {
                warn!(
                    "Directory sync failed; graph and directory may diverge. \
                     intent={} call={} user={} target={} statement={:?} error={}",
                    operation.intent,
                    operation.call,
                    operation.principal_id,
                    operation.target_id,
                    statement,
                    e
                );
                SyncStatus::Failed {
                    error: e.to_string(),
                }
            }
        };

        self.attempts.push(SyncAttempt {
            statement_index: index,
            operation,
            status,
        });
    }
}

#[async_trait]
impl OutcomeObserver for SyncMirror {
    async fn observe(&mut self, index: usize, outcome: &ExecutionOutcome) {
        let executable = strip_comment_lines(&outcome.statement);
        if !is_mutation(&executable) {
            return;
        }

        let intent = classify(&executable);
        if intent == MutationIntent::NonMutating {
            info!("Statement {} is a local-only mutation, not mirrored", index + 1);
            return;
        }
        info!(
            "Statement {} classified as {}: {}",
            index + 1,
            intent,
            executable
        );

        if let Some(error) = outcome.error() {
            debug!("Statement {} failed, nothing to mirror: {}", index + 1, error);
            return;
        }

        let operations = plan_operations(intent, outcome.records());
        if operations.is_empty() {
            warn!(
                "Statement {} ({}) returned no identifier pairs; nothing mirrored",
                index + 1,
                intent
            );
            return;
        }

        self.progress.emit(Stage::Syncing);
        for operation in operations {
            self.deliver(index, &outcome.statement, operation).await;
        }
    }
}
