//! Progress notifications for a running request.
//!
//! Events are purely observational: a dropped or missing receiver never
//! affects the pipeline.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::debug;

/// Pipeline stage named by a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Generating,
    Validating,
    Executing,
    Syncing,
    Refining,
    SummarizingHistory,
    Completed,
    Failed,
}

impl Stage {
    pub fn message(&self) -> &'static str {
        match self {
            Stage::Generating => "Generating statements...",
            Stage::Validating => "Validating statements...",
            Stage::Executing => "Executing statements on the graph store...",
            Stage::Syncing => "Mirroring changes to the directory...",
            Stage::Refining => "Refining response...",
            Stage::SummarizingHistory => "Summarizing history...",
            Stage::Completed => "Completed",
            Stage::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Completed | Stage::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub session_id: String,
    pub stage: Stage,
}

/// Sending half of a session's progress channel.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    session_id: String,
    sender: Option<UnboundedSender<ProgressEvent>>,
}

impl ProgressSink {
    /// Create a sink for `session_id` and the receiver that observes it.
    pub fn channel(session_id: impl Into<String>) -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let sink = Self {
            session_id: session_id.into(),
            sender: Some(sender),
        };
        (sink, receiver)
    }

    /// A sink nobody listens to.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn emit(&self, stage: Stage) {
        debug!("[{}] {}", self.session_id, stage.message());
        if let Some(sender) = &self.sender {
            let _ = sender.send(ProgressEvent {
                session_id: self.session_id.clone(),
                stage,
            });
        }
    }
}

/// Render progress events with a spinner until the channel closes.
pub fn spawn_spinner(mut receiver: UnboundedReceiver<ProgressEvent>, quiet: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        let pb = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));

        while let Some(event) = receiver.recv().await {
            pb.set_message(event.stage.message());
            if event.stage.is_terminal() {
                break;
            }
        }

        pb.finish_and_clear();
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_carry_session_id() {
        let (sink, mut receiver) = ProgressSink::channel("abc");
        sink.emit(Stage::Generating);
        sink.emit(Stage::Completed);

        assert_eq!(
            receiver.recv().await,
            Some(ProgressEvent {
                session_id: "abc".to_string(),
                stage: Stage::Generating
            })
        );
        assert_eq!(receiver.recv().await.unwrap().stage, Stage::Completed);
    }

    #[test]
    fn test_closed_receiver_is_ignored() {
        let (sink, receiver) = ProgressSink::channel("abc");
        drop(receiver);
        sink.emit(Stage::Executing);
        ProgressSink::disabled().emit(Stage::Failed);
    }

    #[tokio::test]
    async fn test_spinner_stops_on_terminal_stage() {
        let (sink, receiver) = ProgressSink::channel("abc");
        let handle = spawn_spinner(receiver, true);
        sink.emit(Stage::Refining);
        sink.emit(Stage::Completed);
        handle.await.unwrap();
    }
}
