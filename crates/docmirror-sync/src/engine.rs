//! Synchronization orchestrator
//!
//! The [`SyncEngine`] mirrors one account into the manifest store:
//!
//! 1. **Account**: fetch the account record, persist it when new or newer.
//! 2. **Repositories**: fetch the account's repository list and reconcile it
//!    with [`RepositoryHandler`] as the per-entity step.
//! 3. **Documents** (per repository): fetch the document list and reconcile
//!    it with [`DocumentHandler`]; then write the table of contents and the
//!    repository detail when the detail is new or newer. Documents that
//!    failed keep their cached listing entry and are retried next run.
//!
//! The account fetch, the repository-list fetch and a missing account login
//! abort the run, as does any storage failure. Everything else is confined
//! to the entity it happened to.
//!
//! ## Concurrency
//!
//! At most `concurrency` remote fetches are in flight across all levels.
//! Cancelling the token stops new fetches; in-flight ones finish, and
//! listings touched by the cancelled run are left as they were.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use docmirror_core::domain::{
    fields, is_newer, DomainError, EntityKind, Namespace, Record, Slug, SyncOutcome,
};
use docmirror_core::ports::{ChildKind, IManifestStore, IRemoteSource};

use crate::layout;
use crate::level::{Applied, Change, EntityHandler, LevelSpec, LevelSynchronizer};
use crate::report::{SyncOptions, SyncRecorder, SyncReport};
use crate::SyncError;

// ============================================================================
// SyncEngine
// ============================================================================

/// Incremental mirror of account → repositories → documents
///
/// ## Dependencies
///
/// - `remote`: read-only origin API
/// - `store`: manifest cache the mirror is written to
pub struct SyncEngine {
    remote: Arc<dyn IRemoteSource>,
    store: Arc<dyn IManifestStore>,
    options: SyncOptions,
}

impl SyncEngine {
    /// Creates a new `SyncEngine` with the given dependencies
    pub fn new(
        remote: Arc<dyn IRemoteSource>,
        store: Arc<dyn IManifestStore>,
        options: SyncOptions,
    ) -> Self {
        Self {
            remote,
            store,
            options,
        }
    }

    /// Performs one synchronization run
    ///
    /// `user` selects the account to mirror; `None` mirrors the account the
    /// remote source is authenticated as.
    ///
    /// # Errors
    /// Returns an error when the account or repository list cannot be
    /// fetched, the account has no login, or the store fails. Per-entity
    /// failures are reported in [`SyncReport::errors`] instead.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn sync(
        &self,
        user: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let started = Instant::now();
        let recorder = SyncRecorder::new();

        info!(
            concurrency = self.options.concurrency,
            trust_repository_timestamps = self.options.trust_repository_timestamps,
            "Starting sync"
        );

        if cancel.is_cancelled() {
            recorder.cancelled();
            return Ok(recorder.finish(started));
        }

        let account = self.sync_account(user, &recorder).await?;
        let login = account.slug(fields::LOGIN).map_err(|e| {
            error!(error = %e, "account record has no usable login");
            SyncError::from(e)
        })?;
        if layout::account_dir(&login) == layout::account_record()? {
            error!(login = %login, "account login collides with the account record");
            return Err(DomainError::InvalidSlug(login.to_string()).into());
        }
        recorder.set_login(login.as_str());

        if cancel.is_cancelled() {
            recorder.cancelled();
            return Ok(recorder.finish(started));
        }

        let repositories = self.remote.fetch_repositories(&login).await.map_err(|e| {
            error!(login = %login, error = %e, "failed to fetch repository list");
            SyncError::from(e)
        })?;
        info!(login = %login, count = repositories.len(), "Fetched repository list");

        let gate = FetchGate::new(self.options.concurrency, cancel);
        let level = LevelSynchronizer::new(
            self.store.as_ref(),
            &recorder,
            cancel,
            self.options.concurrency,
        );
        let handler = RepositoryHandler {
            remote: self.remote.as_ref(),
            store: self.store.as_ref(),
            level: &level,
            gate: &gate,
            login: &login,
            trust_repository_timestamps: self.options.trust_repository_timestamps,
        };
        let spec = LevelSpec {
            kind: EntityKind::Repository,
            collection: layout::repository_list(&login)?,
            children_dir: layout::account_dir(&login),
            child_kind: ChildKind::Directory,
        };
        level.reconcile(&spec, repositories, &handler).await?;

        let report = recorder.finish(started);
        info!(
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            removed = report.removed,
            skipped = report.skipped,
            errors = report.errors.len(),
            cancelled = report.cancelled,
            duration_ms = report.duration_ms,
            "Sync finished"
        );
        Ok(report)
    }

    /// Fetch the account and persist it when new or newer
    ///
    /// A malformed timestamp only skips the write; the run continues with
    /// the freshly fetched record.
    async fn sync_account(
        &self,
        user: Option<&str>,
        recorder: &SyncRecorder,
    ) -> Result<Record, SyncError> {
        let account = self.remote.fetch_account(user).await.map_err(|e| {
            error!(error = %e, "failed to fetch account");
            SyncError::from(e)
        })?;

        let path = layout::account_record()?;
        let outcome = match self.store.read_record(&path).await? {
            None => SyncOutcome::Created,
            Some(cached) => match is_newer(&cached, &account, fields::UPDATED_AT) {
                Ok(true) => SyncOutcome::Updated,
                Ok(false) => SyncOutcome::Unchanged,
                Err(e) => {
                    warn!(path = %path, error = %e, "cannot compare account, not rewriting it");
                    recorder.error(format!("{} {path}: {e}", EntityKind::Account));
                    return Ok(account);
                }
            },
        };

        if outcome.is_change() {
            self.store.write_record(&path, &account).await?;
            info!(account = %account.label(), outcome = %outcome, "account");
        } else {
            debug!(account = %account.label(), "account unchanged");
        }
        recorder.event(EntityKind::Account, &path, outcome);
        Ok(account)
    }
}

// ============================================================================
// FetchGate
// ============================================================================

/// Bounds remote fetches across all levels and refuses new ones once the
/// run is cancelled
struct FetchGate<'a> {
    permits: Semaphore,
    cancel: &'a CancellationToken,
}

impl<'a> FetchGate<'a> {
    fn new(concurrency: usize, cancel: &'a CancellationToken) -> Self {
        Self {
            permits: Semaphore::new(concurrency.max(1)),
            cancel,
        }
    }

    async fn enter(&self) -> Result<SemaphorePermit<'_>, SyncError> {
        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(SyncError::Cancelled),
            permit = self.permits.acquire() => permit.map_err(|_| SyncError::Cancelled),
        }
    }
}

// ============================================================================
// RepositoryHandler
// ============================================================================

/// Per-repository step: refresh the detail if needed and mirror documents
struct RepositoryHandler<'a> {
    remote: &'a dyn IRemoteSource,
    store: &'a dyn IManifestStore,
    level: &'a LevelSynchronizer<'a>,
    gate: &'a FetchGate<'a>,
    login: &'a Slug,
    trust_repository_timestamps: bool,
}

#[async_trait]
impl EntityHandler for RepositoryHandler<'_> {
    async fn apply(&self, change: &Change) -> Result<Applied, SyncError> {
        let namespace = Namespace::new(self.login.clone(), change.id.clone());
        let detail_path = layout::repository_record(&namespace)?;
        let cached_detail = self.store.read_record(&detail_path).await?;

        if self.trust_repository_timestamps
            && change.status == SyncOutcome::Unchanged
            && cached_detail.is_some()
        {
            debug!(namespace = %namespace, "repository unchanged, documents not scanned");
            return Ok(Applied::complete(SyncOutcome::Unchanged));
        }

        // The detail is refreshed when the listing moved or it was never written.
        let mut detail = None;
        if change.status != SyncOutcome::Unchanged || cached_detail.is_none() {
            let fetched = {
                let _permit = self.gate.enter().await?;
                self.remote.fetch_repository_detail(&namespace).await?
            };
            let changed = match &cached_detail {
                None => true,
                Some(cached) => is_newer(cached, &fetched, fields::UPDATED_AT)?,
            };
            if changed {
                detail = Some(fetched);
            }
        }

        let documents = {
            let _permit = self.gate.enter().await?;
            self.remote.fetch_documents(&namespace).await?
        };
        debug!(namespace = %namespace, count = documents.len(), "fetched document list");

        let spec = LevelSpec {
            kind: EntityKind::Document,
            collection: layout::document_list(&namespace)?,
            children_dir: layout::documents_dir(&namespace)?,
            child_kind: ChildKind::Record,
        };
        let handler = DocumentHandler {
            remote: self.remote,
            store: self.store,
            gate: self.gate,
            namespace: &namespace,
        };
        let summary = self.level.reconcile(&spec, documents, &handler).await?;

        if summary.cancelled {
            return Err(SyncError::Cancelled);
        }

        // Detail and toc follow the repository itself, not its documents.
        let outcome = match detail {
            Some(detail) => {
                match detail.get_str(fields::TOC) {
                    Some(toc) => self.store.write_text(&layout::toc(&namespace)?, toc).await?,
                    None => debug!(namespace = %namespace, "repository has no table of contents"),
                }
                self.store.write_record(&detail_path, &detail).await?;
                if cached_detail.is_some() {
                    SyncOutcome::Updated
                } else {
                    SyncOutcome::Created
                }
            }
            None => SyncOutcome::Unchanged,
        };

        if summary.complete {
            return Ok(Applied::complete(outcome));
        }
        if self.trust_repository_timestamps {
            // The listing entry is held back so the next run rescans the documents.
            warn!(namespace = %namespace, "some documents failed, repository listing entry held back");
            Ok(Applied::incomplete(outcome))
        } else {
            warn!(namespace = %namespace, "some documents failed, retried on the next run");
            Ok(Applied::complete(outcome))
        }
    }
}

// ============================================================================
// DocumentHandler
// ============================================================================

/// Per-document step: fetch and write the detail when new or newer
struct DocumentHandler<'a> {
    remote: &'a dyn IRemoteSource,
    store: &'a dyn IManifestStore,
    gate: &'a FetchGate<'a>,
    namespace: &'a Namespace,
}

#[async_trait]
impl EntityHandler for DocumentHandler<'_> {
    async fn apply(&self, change: &Change) -> Result<Applied, SyncError> {
        if change.status == SyncOutcome::Unchanged {
            return Ok(Applied::complete(SyncOutcome::Unchanged));
        }

        let detail = {
            let _permit = self.gate.enter().await?;
            self.remote
                .fetch_document_detail(self.namespace, &change.id)
                .await?
        };
        self.store.write_record(&change.path, &detail).await?;

        Ok(Applied::complete(change.status))
    }
}
