//! docmirror Remote - Yuque-style REST API client
//!
//! Provides an async client for the read-only endpoints the mirror needs:
//! - The account record (`user` / `users/{login}`)
//! - Repository lists and repository detail (with table of contents)
//! - Document lists and document detail
//!
//! ## Modules
//!
//! - [`client`] - HTTP client: base URL, auth headers, `{"data": ...}` envelope
//! - [`provider`] - [`IRemoteSource`](docmirror_core::ports::IRemoteSource) implementation

pub mod client;
pub mod provider;

pub use client::YuqueClient;
pub use provider::YuqueRemoteSource;
