//! docmirror Sync - Incremental synchronization engine
//!
//! Provides:
//! - Per-level reconciliation of a remote listing against the cache
//! - The account → repositories → documents orchestration
//! - Bounded concurrency and run-level cancellation
//!
//! ## Modules
//!
//! - [`engine`] - [`SyncEngine`], the orchestrator, and the per-level handlers
//! - [`level`] - [`LevelSynchronizer`], the generic diff/apply algorithm
//! - [`layout`] - Where each entity lives in the manifest store
//! - [`report`] - Run options and the run report

pub mod engine;
pub mod layout;
pub mod level;
pub mod report;

pub use engine::SyncEngine;
pub use level::{Applied, Change, EntityHandler, LevelSpec, LevelSummary, LevelSynchronizer};
pub use report::{SyncEvent, SyncOptions, SyncRecorder, SyncReport};

use docmirror_core::domain::DomainError;
use docmirror_core::ports::{RemoteError, StoreError};
use thiserror::Error;

/// Errors that can occur during synchronization
#[derive(Debug, Error)]
pub enum SyncError {
    /// A remote fetch failed
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// The local cache could not be read or written
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// A record is missing its identifier or has a malformed timestamp
    #[error("Invalid record: {0}")]
    Domain(#[from] DomainError),

    /// The run was cancelled before this work started
    #[error("Synchronization cancelled")]
    Cancelled,
}

impl SyncError {
    /// Whether this error aborts the whole run when raised for one entity
    ///
    /// Storage failures are fatal. Remote and record errors only skip the
    /// entity they were raised for; the orchestrator escalates them itself
    /// for the account and repository-list fetches.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
