//! Graph store access.
//!
//! A [`GraphStore`] is built once at process start and closed once at
//! shutdown. Each batch opens its own [`GraphSession`], which is never
//! shared between batches.

pub mod http;
pub mod value;

pub use http::HttpGraphStore;
pub use value::{normalize_record, GraphRecord, GraphValue, ResultRecord};

use crate::error::StoreError;
use async_trait::async_trait;
use std::time::Duration;

/// Process-wide store handle, safe for concurrent session creation.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Open a session whose statements are each bounded by `statement_timeout`.
    async fn open_session(
        &self,
        statement_timeout: Duration,
    ) -> Result<Box<dyn GraphSession>, StoreError>;

    /// Release the store. Calling it more than once is a no-op.
    async fn close(&self);
}

/// A session owned by exactly one batch run.
#[async_trait]
pub trait GraphSession: Send {
    /// Run one statement and return its records in store order.
    async fn run(&mut self, statement: &str) -> Result<Vec<GraphRecord>, StoreError>;

    /// Release the session.
    async fn close(self: Box<Self>);
}
