//! Markdown and JSON rendering.
//!
//! This module renders batch responses and full reports for the
//! terminal or an output file.

use crate::graph::ResultRecord;
use crate::models::{
    BatchResponse, ExecutionOutcome, FullReport, ReportSection, RunMetadata, SyncAttempt,
    SyncStatus,
};
use anyhow::Result;
use serde::Serialize;

/// Generate Markdown for a batch response.
pub fn generate_batch_markdown(response: &BatchResponse, metadata: &RunMetadata) -> String {
    let mut output = String::new();

    output.push_str("# GraphMirror Response\n\n");

    output.push_str(&generate_metadata_section(metadata));
    output.push_str(&format!("- **Mode:** {}\n", response.mode));
    output.push_str(&format!("- **Statements:** {}\n", response.statements.len()));
    if response.failed_statements() > 0 {
        output.push_str(&format!(
            "- **Failed Statements:** {}\n",
            response.failed_statements()
        ));
    }
    output.push('\n');

    output.push_str("## Answer\n\n");
    output.push_str(&response.narrative);
    output.push_str("\n\n");

    output.push_str(&generate_outcomes_section(response));
    output.push_str(&generate_sync_section(&response.sync));

    if let Some(ref history) = response.history {
        output.push_str("## History\n\n");
        output.push_str(history);
        output.push_str("\n\n");
    }

    output.push_str(&generate_footer());

    output
}

/// Generate Markdown for the full report.
pub fn generate_report_markdown(report: &FullReport, metadata: &RunMetadata) -> String {
    let mut output = String::new();

    output.push_str("# Access Review Report\n\n");

    output.push_str(&generate_metadata_section(metadata));
    output.push_str(&format!("- **Sections:** {}\n", report.sections.len()));
    if report.failed_sections() > 0 {
        output.push_str(&format!(
            "- **Failed Sections:** {}\n",
            report.failed_sections()
        ));
    }
    output.push('\n');

    output.push_str("## Table of Contents\n\n");
    for (i, section) in report.sections.iter().enumerate() {
        output.push_str(&format!(
            "{}. [{}](#{})\n",
            i + 1,
            section.title,
            anchor(&section.title)
        ));
    }
    output.push('\n');

    for section in &report.sections {
        output.push_str(&generate_report_section(section));
    }

    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &RunMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Request:** {}\n", metadata.request));
    section.push_str(&format!("- **Session:** `{}`\n", metadata.session_id));
    section.push_str(&format!(
        "- **Date:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Duration:** {:.1}s\n", metadata.duration_seconds));

    section
}

fn generate_outcomes_section(response: &BatchResponse) -> String {
    let mut section = String::new();

    section.push_str("## Statements\n\n");

    if response.outcomes.is_empty() {
        section.push_str("No statements were generated.\n\n");
        return section;
    }

    let generated = response.statements.len();
    for (i, outcome) in response.outcomes.iter().enumerate() {
        if i >= generated {
            section.push_str(&format!("### Fallback {}\n\n", i + 1 - generated));
        } else {
            section.push_str(&format!("### Statement {}\n\n", i + 1));
        }
        section.push_str(&generate_outcome_block(outcome));
    }

    section
}

fn generate_outcome_block(outcome: &ExecutionOutcome) -> String {
    let mut block = String::new();

    block.push_str("```cypher\n");
    block.push_str(&outcome.statement);
    block.push_str("\n```\n\n");

    match outcome.error() {
        Some(error) => block.push_str(&format!("> ❌ **Error:** {}\n\n", error)),
        None => block.push_str(&generate_records_block(outcome.records())),
    }

    block
}

fn generate_records_block(records: &[ResultRecord]) -> String {
    if records.is_empty() {
        return "*No records.*\n\n".to_string();
    }

    let mut block = format!("**Records:** {}\n\n", records.len());
    let json = serde_json::to_string_pretty(records).unwrap_or_default();
    block.push_str("<details>\n<summary>View Records</summary>\n\n```json\n");
    block.push_str(&json);
    block.push_str("\n```\n</details>\n\n");

    block
}

fn generate_sync_section(attempts: &[SyncAttempt]) -> String {
    if attempts.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Directory Sync\n\n");
    section.push_str("| Statement | Call | User | Target | Result |\n");
    section.push_str("|:---:|:---|:---|:---|:---|\n");

    for attempt in attempts {
        let result = match &attempt.status {
            SyncStatus::Delivered { code } if attempt.succeeded() => format!("✅ {}", code),
            SyncStatus::Delivered { code } => format!("⚠️ {}", code),
            SyncStatus::Skipped => "⏭️ skipped".to_string(),
            SyncStatus::Failed { error } => format!("❌ {}", error.replace('|', "\\|")),
        };
        section.push_str(&format!(
            "| {} | {} | `{}` | `{}` | {} |\n",
            attempt.statement_index + 1,
            attempt.operation.call,
            attempt.operation.principal_id,
            attempt.operation.target_id,
            result
        ));
    }
    section.push('\n');

    section
}

fn generate_report_section(section: &ReportSection) -> String {
    let mut block = String::new();

    block.push_str(&format!("## {}\n\n", section.title));
    block.push_str(&format!("{}\n\n", section.description));
    block.push_str(&format!("**Insight:** {}\n\n", section.insight));
    block.push_str(&format!(
        "> 💡 **Recommendation:** {}\n\n",
        section.recommendation
    ));
    block.push_str(&generate_outcome_block(&section.outcome));
    block.push_str("---\n\n");

    block
}

fn anchor(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}

fn generate_footer() -> String {
    format!(
        "---\n\n*Generated by GraphMirror v{}*\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Serialize any response structure as pretty JSON.
pub fn generate_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}
