//! docmirror Cache - Local manifest persistence
//!
//! File-backed cache for:
//! - The account record (`user.json`)
//! - Repository lists, details and tables of contents
//! - Document lists and document details
//!
//! ## Architecture
//!
//! This crate implements the `IManifestStore` port from `docmirror-core`.
//! It is a driven (secondary) adapter in the hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`FileManifestStore`] - JSON files under a configured directory
//! - [`InMemoryManifestStore`] - Map-backed store for tests, with a write counter
//!
//! ## Usage
//!
//! ```no_run
//! use docmirror_cache::FileManifestStore;
//! use docmirror_core::domain::ManifestPath;
//! use docmirror_core::ports::IManifestStore;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = FileManifestStore::new("storage/.meta");
//! let user = store.read_record(&ManifestPath::new("user.json")?).await?;
//! # Ok(())
//! # }
//! ```

pub mod file_store;
pub mod memory;

pub use file_store::FileManifestStore;
pub use memory::InMemoryManifestStore;
