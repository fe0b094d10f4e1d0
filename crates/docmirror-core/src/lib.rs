//! docmirror Core - Domain types, ports and configuration
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `Record`, `Snapshot`, `Slug`, `Namespace`, `ManifestPath`, `SyncOutcome`
//! - **Timestamp comparison** - the whole-second `is_newer` rule deciding staleness
//! - **Port definitions** - Traits for adapters: `IRemoteSource`, `IManifestStore`
//! - **Configuration** - YAML-backed settings for remote, storage, sync and logging
//!
//! # Architecture
//!
//! The domain module is pure and performs no I/O. Ports define trait
//! interfaces that adapter crates implement (`docmirror-remote`,
//! `docmirror-cache`), and the synchronization engine in `docmirror-sync`
//! drives them.

pub mod config;
pub mod domain;
pub mod ports;
