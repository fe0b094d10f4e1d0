//! Remote source port (driven/secondary port)
//!
//! This module defines the read-only interface to the origin API that owns
//! the account → repositories → documents hierarchy. Authentication,
//! transport and rate limits are the adapter's concern.
//!
//! ## Design Notes
//!
//! - Uses a typed [`RemoteError`] rather than `anyhow` because the engine
//!   must tell remote failures (skip the entity) apart from storage failures
//!   (abort the run).
//! - Every call either returns fully populated records or fails; the engine
//!   never retries.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::newtypes::{Namespace, Slug};
use crate::domain::record::{Record, Snapshot};

/// Errors returned by a remote source
///
/// All variants belong to the "remote request failed" class: the engine
/// handles them per entity, except for the account and repository-list
/// fetches which abort the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The remote answered with a non-success status
    #[error("Remote request failed with status {status}: {body}")]
    RequestFailed {
        /// HTTP status code
        status: u16,
        /// Response body, verbatim
        body: String,
    },

    /// The request could not be completed (connection, TLS, timeout)
    #[error("Remote transport error: {0}")]
    Transport(String),

    /// The remote answered successfully but the payload has the wrong shape
    #[error("Malformed remote payload: {0}")]
    MalformedPayload(String),
}

/// Port trait for the origin API
#[async_trait]
pub trait IRemoteSource: Send + Sync {
    /// Fetches the account record
    ///
    /// With `user = None` the authenticated account is returned; otherwise
    /// the public record of the named account.
    async fn fetch_account(&self, user: Option<&str>) -> Result<Record, RemoteError>;

    /// Lists the repositories of the account identified by `login`
    async fn fetch_repositories(&self, login: &Slug) -> Result<Snapshot, RemoteError>;

    /// Fetches a repository's detail record (carries the table of contents)
    async fn fetch_repository_detail(&self, namespace: &Namespace) -> Result<Record, RemoteError>;

    /// Lists the documents of a repository
    async fn fetch_documents(&self, namespace: &Namespace) -> Result<Snapshot, RemoteError>;

    /// Fetches one document's detail record
    async fn fetch_document_detail(
        &self,
        namespace: &Namespace,
        slug: &Slug,
    ) -> Result<Record, RemoteError>;
}
