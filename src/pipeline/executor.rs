//! Sequential statement execution with per-statement fault isolation.

use crate::error::StoreError;
use crate::graph::{normalize_record, GraphSession, GraphStore};
use crate::models::ExecutionOutcome;
use crate::pipeline::splitter::strip_comment_lines;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Hook invoked after each statement completes, before the next one runs.
#[async_trait]
pub trait OutcomeObserver: Send {
    async fn observe(&mut self, index: usize, outcome: &ExecutionOutcome);
}

/// Observer that does nothing.
pub struct NoopObserver;

#[async_trait]
impl OutcomeObserver for NoopObserver {
    async fn observe(&mut self, _index: usize, _outcome: &ExecutionOutcome) {}
}

/// Run `statements` in order on one session.
///
/// Always returns exactly one outcome per statement. A failing statement
/// never stops later ones, and the session is closed before returning.
pub async fn execute_batch(
    store: &dyn GraphStore,
    statements: &[String],
    statement_timeout: Duration,
    observer: &mut dyn OutcomeObserver,
) -> Vec<ExecutionOutcome> {
    let mut outcomes = Vec::with_capacity(statements.len());

    let mut session = match store.open_session(statement_timeout).await {
        Ok(session) => session,
        Err(e) => {
            error!("Cannot open graph session: {}", e);
            for (index, statement) in statements.iter().enumerate() {
                let outcome = ExecutionOutcome::failure(statement.clone(), e.to_string());
                observer.observe(index, &outcome).await;
                outcomes.push(outcome);
            }
            return outcomes;
        }
    };

    for (index, statement) in statements.iter().enumerate() {
        info!("Executing statement {}/{}", index + 1, statements.len());
        let outcome = run_one(session.as_mut(), statement, statement_timeout).await;
        observer.observe(index, &outcome).await;
        outcomes.push(outcome);
    }

    session.close().await;
    outcomes
}

async fn run_one(
    session: &mut dyn GraphSession,
    statement: &str,
    statement_timeout: Duration,
) -> ExecutionOutcome {
    let executable = strip_comment_lines(statement);
    if executable.is_empty() {
        debug!("Statement has no executable text: {}", statement);
        return ExecutionOutcome::success(statement, Vec::new());
    }
    debug!("Statement text: {}", executable);

    let result = match tokio::time::timeout(statement_timeout, session.run(&executable)).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(statement_timeout.as_secs())),
    };

    match result {
        Ok(records) => {
            if records.is_empty() {
                debug!("No records returned for: {}", executable);
            }
            let records = records.iter().map(normalize_record).collect();
            ExecutionOutcome::success(statement, records)
        }
        Err(e) => {
            warn!("Statement failed: {} ({})", executable, e);
            ExecutionOutcome::failure(statement, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{node, record, text, FakeStore};
    use serde_json::json;

    struct Recording(Vec<usize>);

    #[async_trait]
    impl OutcomeObserver for Recording {
        async fn observe(&mut self, index: usize, _outcome: &ExecutionOutcome) {
            self.0.push(index);
        }
    }

    fn syntax_error() -> StoreError {
        StoreError::Statement {
            code: "Neo.ClientError.Statement.SyntaxError".to_string(),
            message: "Invalid input 'MATC'".to_string(),
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_statements() {
        let store = FakeStore::new()
            .respond("MATC (u:User) RETURN u", Err(syntax_error()))
            .respond(
                "MATCH (u:User) RETURN u",
                Ok(vec![record(&[("u", node(&[("id", text("u-1"))]))])]),
            );
        let statements = vec![
            "MATC (u:User) RETURN u".to_string(),
            "MATCH (u:User) RETURN u".to_string(),
        ];

        let outcomes = execute_batch(&store, &statements, Duration::from_secs(5), &mut NoopObserver).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(
            outcomes[0].error(),
            Some("Neo.ClientError.Statement.SyntaxError: Invalid input 'MATC'")
        );
        assert_eq!(outcomes[1].records()[0]["u"], json!({"id": "u-1"}));
        assert_eq!(store.sessions_opened(), 1);
        assert_eq!(store.sessions_closed(), 1);
    }

    #[tokio::test]
    async fn test_every_outcome_has_records_xor_error() {
        let store = FakeStore::new().respond("RETURN 2", Err(syntax_error()));
        let statements: Vec<String> = ["RETURN 1", "RETURN 2", "RETURN 3"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let outcomes = execute_batch(&store, &statements, Duration::from_secs(5), &mut NoopObserver).await;

        for (outcome, statement) in outcomes.iter().zip(&statements) {
            assert_eq!(&outcome.statement, statement);
            assert_ne!(outcome.is_success(), outcome.error().is_some());
        }
        assert_eq!(store.executed(), statements);
    }

    #[tokio::test]
    async fn test_comment_lines_are_stripped_before_execution() {
        let store = FakeStore::new();
        let statement = "// everyone\nMATCH (u:User) RETURN u".to_string();

        let outcomes = execute_batch(
            &store,
            &[statement.clone()],
            Duration::from_secs(5),
            &mut NoopObserver,
        )
        .await;

        assert_eq!(store.executed(), vec!["MATCH (u:User) RETURN u"]);
        assert_eq!(outcomes[0].statement, statement);
    }

    #[tokio::test]
    async fn test_comment_only_statement_is_not_sent() {
        let store = FakeStore::new();
        let outcomes = execute_batch(
            &store,
            &["// nothing to do".to_string()],
            Duration::from_secs(5),
            &mut NoopObserver,
        )
        .await;

        assert!(store.executed().is_empty());
        assert!(outcomes[0].is_success());
    }

    #[tokio::test]
    async fn test_slow_statement_times_out_and_batch_continues() {
        let store = FakeStore::new().delay("RETURN 1", Duration::from_secs(5));
        let statements = vec!["RETURN 1".to_string(), "RETURN 2".to_string()];

        let outcomes = execute_batch(&store, &statements, Duration::from_millis(50), &mut NoopObserver).await;

        assert_eq!(outcomes[0].error(), Some(StoreError::Timeout(0).to_string().as_str()));
        assert!(outcomes[1].is_success());
    }

    #[tokio::test]
    async fn test_session_open_failure_fails_every_statement() {
        let store = FakeStore::new().fail_open(StoreError::Connection("http://graph:7474".to_string()));
        let statements = vec!["RETURN 1".to_string(), "RETURN 2".to_string()];
        let mut observer = Recording(Vec::new());

        let outcomes = execute_batch(&store, &statements, Duration::from_secs(5), &mut observer).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.error().unwrap().contains("graph:7474")));
        assert_eq!(observer.0, vec![0, 1]);
        assert!(store.executed().is_empty());
    }

    #[tokio::test]
    async fn test_observer_sees_statements_in_order() {
        let store = FakeStore::new();
        let statements = vec!["RETURN 1".to_string(), "RETURN 2".to_string(), "RETURN 3".to_string()];
        let mut observer = Recording(Vec::new());

        execute_batch(&store, &statements, Duration::from_secs(5), &mut observer).await;

        assert_eq!(observer.0, vec![0, 1, 2]);
    }
}
