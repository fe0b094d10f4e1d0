//! Manifest store port (driven/secondary port)
//!
//! Durable, path-addressed storage of entity records and collection
//! snapshots. The store never touches the network.
//!
//! ## Contract
//!
//! - Reads of missing paths return `Ok(None)`, never an error.
//! - Writes create parent segments as needed and are atomic from the
//!   caller's perspective: a subsequent read sees either the old or the new
//!   content, never a partial write.
//! - `delete_subtree` removes a record or an entire directory of records and
//!   is a no-op if the path is absent.
//! - `list_child_ids` reports what is actually materialized on disk, which is
//!   the authoritative source for orphan detection.

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::newtypes::ManifestPath;
use crate::domain::record::{Record, Snapshot};

/// Local storage errors. Always fatal for a sync run.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O operation failed (permissions, disk full, ...)
    #[error("Storage I/O error at '{path}': {source}")]
    Io {
        /// Store path being accessed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A stored file could not be encoded or decoded
    #[error("Storage serialization error at '{path}': {message}")]
    Serialization {
        /// Store path being accessed
        path: String,
        /// Description of the failure
        message: String,
    },

    /// The path is not usable for this operation (e.g. writing the root)
    #[error("Invalid storage path: {0}")]
    InvalidPath(String),
}

impl StoreError {
    /// Build an [`StoreError::Io`] for `path`
    pub fn io(path: &ManifestPath, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            source,
        }
    }

    /// Build a [`StoreError::Serialization`] for `path`
    pub fn serialization(path: &ManifestPath, message: impl ToString) -> Self {
        Self::Serialization {
            path: path.to_string(),
            message: message.to_string(),
        }
    }
}

/// How children of a parent are materialized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    /// Each child is a directory named by its id (repositories)
    Directory,
    /// Each child is a `{id}.json` record file (documents)
    Record,
}

/// File name suffix of a [`ChildKind::Record`] child
pub const RECORD_SUFFIX: &str = ".json";

/// Port trait for the local manifest cache
#[async_trait]
pub trait IManifestStore: Send + Sync {
    /// Reads a single record; `None` if the path does not exist
    async fn read_record(&self, path: &ManifestPath) -> Result<Option<Record>, StoreError>;

    /// Reads a previously saved collection snapshot; `None` if absent
    async fn read_collection(&self, path: &ManifestPath) -> Result<Option<Snapshot>, StoreError>;

    /// Enumerates identifiers of children materialized under `parent`
    ///
    /// Returns an empty set if `parent` does not exist.
    async fn list_child_ids(
        &self,
        parent: &ManifestPath,
        kind: ChildKind,
    ) -> Result<BTreeSet<String>, StoreError>;

    /// Writes (creates or replaces) a record
    async fn write_record(&self, path: &ManifestPath, record: &Record) -> Result<(), StoreError>;

    /// Writes (creates or replaces) a collection snapshot
    async fn write_collection(
        &self,
        path: &ManifestPath,
        snapshot: &Snapshot,
    ) -> Result<(), StoreError>;

    /// Writes a text artifact verbatim (e.g. a YAML table of contents)
    async fn write_text(&self, path: &ManifestPath, text: &str) -> Result<(), StoreError>;

    /// Removes a record or a directory of records; no-op if absent
    async fn delete_subtree(&self, path: &ManifestPath) -> Result<(), StoreError>;
}
