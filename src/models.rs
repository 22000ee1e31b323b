//! Data models for the statement pipeline.
//!
//! This module contains the structures that flow between the pipeline
//! stages and out to the renderers: per-statement outcomes, mutation
//! intents, directory sync operations and report sections.

use crate::graph::ResultRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which prompt family primes the statement generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestMode {
    /// Read-oriented queries, validated before execution.
    #[default]
    Query,
    /// Mutations only, each returning the touched nodes.
    Action,
}

impl fmt::Display for RequestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestMode::Query => write!(f, "Query"),
            RequestMode::Action => write!(f, "Action"),
        }
    }
}

/// Chat model used to generate statements.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ModelVariant {
    #[default]
    Primary,
    Alternate,
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelVariant::Primary => write!(f, "primary"),
            ModelVariant::Alternate => write!(f, "alternate"),
        }
    }
}

/// Result of executing one statement: records or an error, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Statement text as it appeared in the batch.
    pub statement: String,
    #[serde(flatten)]
    pub result: OutcomeResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeResult {
    Records(Vec<ResultRecord>),
    Error(String),
}

impl ExecutionOutcome {
    pub fn success(statement: impl Into<String>, records: Vec<ResultRecord>) -> Self {
        Self {
            statement: statement.into(),
            result: OutcomeResult::Records(records),
        }
    }

    pub fn failure(statement: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            result: OutcomeResult::Error(error.into()),
        }
    }

    /// Records returned by the store; empty for a failed statement.
    pub fn records(&self) -> &[ResultRecord] {
        match &self.result {
            OutcomeResult::Records(records) => records,
            OutcomeResult::Error(_) => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.result {
            OutcomeResult::Records(_) => None,
            OutcomeResult::Error(error) => Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.result, OutcomeResult::Records(_))
    }

    /// True when the statement succeeded with at least one record.
    pub fn has_data(&self) -> bool {
        !self.records().is_empty()
    }
}

/// Semantic effect of a statement on identity relationships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationIntent {
    GroupMembershipAdd,
    GroupMembershipRemove,
    RoleAssignmentAdd,
    RoleAssignmentRemove,
    NonMutating,
}

impl fmt::Display for MutationIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationIntent::GroupMembershipAdd => "GroupMembershipAdd",
            MutationIntent::GroupMembershipRemove => "GroupMembershipRemove",
            MutationIntent::RoleAssignmentAdd => "RoleAssignmentAdd",
            MutationIntent::RoleAssignmentRemove => "RoleAssignmentRemove",
            MutationIntent::NonMutating => "NonMutating",
        };
        write!(f, "{}", name)
    }
}

/// Create or delete semantics of a directory call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMethod {
    Create,
    Delete,
}

/// The four relationship calls the directory service exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DirectoryCall {
    AddPrincipalToGroup,
    RemovePrincipalFromGroup,
    AssignRoleToPrincipal,
    RemoveRoleFromPrincipal,
}

impl DirectoryCall {
    /// Directory call mirroring an intent, `None` for `NonMutating`.
    pub fn for_intent(intent: MutationIntent) -> Option<Self> {
        match intent {
            MutationIntent::GroupMembershipAdd => Some(DirectoryCall::AddPrincipalToGroup),
            MutationIntent::GroupMembershipRemove => Some(DirectoryCall::RemovePrincipalFromGroup),
            MutationIntent::RoleAssignmentAdd => Some(DirectoryCall::AssignRoleToPrincipal),
            MutationIntent::RoleAssignmentRemove => Some(DirectoryCall::RemoveRoleFromPrincipal),
            MutationIntent::NonMutating => None,
        }
    }

    pub fn method(&self) -> SyncMethod {
        match self {
            DirectoryCall::AddPrincipalToGroup | DirectoryCall::AssignRoleToPrincipal => {
                SyncMethod::Create
            }
            DirectoryCall::RemovePrincipalFromGroup | DirectoryCall::RemoveRoleFromPrincipal => {
                SyncMethod::Delete
            }
        }
    }

    /// Path of the call relative to the directory base address.
    pub fn path(&self) -> &'static str {
        match self {
            DirectoryCall::AddPrincipalToGroup => "/api/addUserToGroup",
            DirectoryCall::RemovePrincipalFromGroup => "/api/removeUserFromGroup",
            DirectoryCall::AssignRoleToPrincipal => "/api/assignDirectoryRoleToUser",
            DirectoryCall::RemoveRoleFromPrincipal => "/api/removeRoleFromUser",
        }
    }

    /// Query parameter that carries the target identifier.
    pub fn target_param(&self) -> &'static str {
        match self {
            DirectoryCall::AddPrincipalToGroup | DirectoryCall::RemovePrincipalFromGroup => {
                "groupId"
            }
            DirectoryCall::AssignRoleToPrincipal => "roleDefinitionId",
            DirectoryCall::RemoveRoleFromPrincipal => "roleId",
        }
    }

    /// True for calls whose target is a group rather than a role.
    pub fn targets_group(&self) -> bool {
        matches!(
            self,
            DirectoryCall::AddPrincipalToGroup | DirectoryCall::RemovePrincipalFromGroup
        )
    }
}

impl fmt::Display for DirectoryCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DirectoryCall::AddPrincipalToGroup => "add-principal-to-group",
            DirectoryCall::RemovePrincipalFromGroup => "remove-principal-from-group",
            DirectoryCall::AssignRoleToPrincipal => "assign-role-to-principal",
            DirectoryCall::RemoveRoleFromPrincipal => "remove-role-from-principal",
        };
        write!(f, "{}", name)
    }
}

/// One directory call with both identifiers present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOperation {
    pub intent: MutationIntent,
    pub call: DirectoryCall,
    pub principal_id: String,
    pub target_id: String,
}

impl SyncOperation {
    /// Query parameters in the order the directory API documents them.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let target = (self.call.target_param(), self.target_id.clone());
        let principal = ("userId", self.principal_id.clone());
        if self.call.targets_group() {
            vec![target, principal]
        } else {
            vec![principal, target]
        }
    }
}

/// What happened when a sync operation was handed to the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SyncStatus {
    /// The directory answered with this HTTP status.
    Delivered { code: u16 },
    /// Mirroring is disabled; nothing was sent.
    Skipped,
    /// Transport failure or timeout.
    Failed { error: String },
}

/// Ledger entry for one sync operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncAttempt {
    /// Index of the originating statement in the batch.
    pub statement_index: usize,
    pub operation: SyncOperation,
    #[serde(flatten)]
    pub status: SyncStatus,
}

impl SyncAttempt {
    /// False for transport failures and non-2xx answers.
    pub fn succeeded(&self) -> bool {
        match self.status {
            SyncStatus::Delivered { code } => (200..300).contains(&code),
            SyncStatus::Skipped => true,
            SyncStatus::Failed { .. } => false,
        }
    }
}

/// Inbound request for one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub request: String,
    #[serde(default)]
    pub history: Option<String>,
    #[serde(default)]
    pub mode: RequestMode,
    #[serde(default)]
    pub variant: ModelVariant,
    pub session_id: String,
}

/// Everything a batch run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub session_id: String,
    pub mode: RequestMode,
    /// Statements in batch order.
    pub statements: Vec<String>,
    /// One outcome per statement, plus a trailing fallback outcome if one fired.
    pub outcomes: Vec<ExecutionOutcome>,
    /// Directory calls issued for mutating statements.
    pub sync: Vec<SyncAttempt>,
    pub narrative: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<String>,
    pub fallback_used: bool,
    pub no_data: bool,
}

impl BatchResponse {
    pub fn failed_statements(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }

    pub fn failed_syncs(&self) -> usize {
        self.sync.iter().filter(|a| !a.succeeded()).count()
    }

    /// True when any statement or directory call failed.
    pub fn has_failures(&self) -> bool {
        self.failed_statements() > 0 || self.failed_syncs() > 0
    }
}

/// A report section: fixed narrative plus the outcome of its statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    pub title: String,
    pub description: String,
    pub insight: String,
    pub recommendation: String,
    pub outcome: ExecutionOutcome,
}

impl ReportSection {
    /// Records of the section; a failed section reports none.
    pub fn records(&self) -> &[ResultRecord] {
        self.outcome.records()
    }
}

/// The full analytical report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullReport {
    pub session_id: String,
    pub generated_at: DateTime<Utc>,
    pub sections: Vec<ReportSection>,
}

impl FullReport {
    pub fn failed_sections(&self) -> usize {
        self.sections
            .iter()
            .filter(|s| !s.outcome.is_success())
            .count()
    }
}

/// Metadata shown at the top of rendered output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub request: String,
    pub session_id: String,
    pub generated_at: DateTime<Utc>,
    pub duration_seconds: f64,
}
