//! Domain entities and business logic
//!
//! This module contains the core domain types for docmirror:
//! - Newtypes for validated identifiers and store paths
//! - Entity records and collection snapshots
//! - The timestamp comparator
//! - Per-entity synchronization outcomes
//! - Domain-specific error types

pub mod errors;
pub mod newtypes;
pub mod outcome;
pub mod record;
pub mod timestamp;

// Re-export commonly used types
pub use errors::DomainError;
pub use newtypes::{ManifestPath, Namespace, Slug};
pub use outcome::{EntityKind, SyncOutcome};
pub use record::{fields, Record, Snapshot};
pub use timestamp::{is_newer, parse_timestamp};
