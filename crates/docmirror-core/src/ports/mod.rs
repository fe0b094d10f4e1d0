//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the synchronization
//! engine depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteSource`] - Read-only access to the origin API
//! - [`IManifestStore`] - Path-addressed local cache of records

pub mod manifest_store;
pub mod remote_source;

pub use manifest_store::{ChildKind, IManifestStore, StoreError, RECORD_SUFFIX};
pub use remote_source::{IRemoteSource, RemoteError};
