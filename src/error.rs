//! Error types for the pipeline's external collaborators.
//!
//! Statement and directory failures are captured per item and never
//! abort a batch; only a generation failure aborts a request.

use thiserror::Error;

/// Failure reported by the graph store for one statement or session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Cannot connect to graph store at {0}")]
    Connection(String),

    #[error("Graph store is closed")]
    Closed,

    #[error("Graph store returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("{code}: {message}")]
    Statement { code: String, message: String },

    #[error("Statement timed out after {0}s")]
    Timeout(u64),

    #[error("Malformed graph store response: {0}")]
    Malformed(String),
}

/// Failure calling the chat model that generates or summarizes text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("No chat endpoint configured for the {0} model")]
    MissingEndpoint(String),

    #[error("Cannot connect to chat endpoint {0}")]
    Unreachable(String),

    #[error("Chat request timed out after {0}s")]
    Timeout(u64),

    #[error("Chat endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed chat response: {0}")]
    Malformed(String),
}

/// Failure delivering one directory call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("Directory call timed out after {0}s")]
    Timeout(u64),

    #[error("Directory call failed: {0}")]
    Transport(String),
}

/// Request-level failure. Everything else is recorded in the response.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Statement generation failed: {0}")]
    GenerationFailure(#[from] GenerationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_error_keeps_store_text() {
        let err = StoreError::Statement {
            code: "Neo.ClientError.Statement.SyntaxError".to_string(),
            message: "Invalid input 'MATC'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Neo.ClientError.Statement.SyntaxError: Invalid input 'MATC'"
        );
    }

    #[test]
    fn test_generation_failure_wraps_source() {
        let err: PipelineError = GenerationError::Timeout(30).into();
        assert!(err.to_string().contains("timed out after 30s"));
    }
}
