//! Directory service access.
//!
//! The directory is the system of record for group memberships and role
//! assignments. Calls are best-effort: a status code is logged, never
//! acted upon.

pub mod client;

pub use client::{DisabledDirectory, HttpDirectoryClient};

use crate::error::SyncError;
use crate::models::SyncOperation;
use async_trait::async_trait;

#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Send one operation.
    ///
    /// Returns the HTTP status the directory answered with, or `None`
    /// when nothing was sent.
    async fn send(&self, operation: &SyncOperation) -> Result<Option<u16>, SyncError>;
}
