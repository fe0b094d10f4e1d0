//! Level synchronizer
//!
//! Reconciles one remote listing against the cache at one level of the
//! hierarchy (repositories of an account, or documents of a repository).
//!
//! ## Algorithm
//!
//! 1. **Deletion pass**: every child materialized under the level's
//!    directory (`list_child_ids`) that is absent from the remote listing is
//!    deleted. The cached list file is not consulted, so orphans are found
//!    even when it is missing or stale.
//! 2. **Per-entity pass**: each remote entity, in remote order, is
//!    classified against its cached counterpart as created, updated or
//!    unchanged, and handed to an [`EntityHandler`]. A counterpart only
//!    counts when the child is materialized.
//! 3. **List write**: the listing is persisted after every entity finished.
//!    Entities that failed keep their previous entry so the next run retries
//!    them. Nothing is written when the list is unchanged or the run was
//!    cancelled.
//!
//! Up to `concurrency` entities are processed at once. Results are consumed
//! in remote order.

use std::collections::BTreeSet;

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use docmirror_core::domain::{
    fields, is_newer, DomainError, EntityKind, ManifestPath, Record, Slug, Snapshot, SyncOutcome,
};
use docmirror_core::ports::{ChildKind, IManifestStore, RECORD_SUFFIX};

use crate::report::SyncRecorder;
use crate::SyncError;

// ============================================================================
// LevelSpec
// ============================================================================

/// Where one level of the hierarchy lives in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSpec {
    /// Kind of the entities at this level
    pub kind: EntityKind,
    /// The persisted listing (e.g. `alice/repos.json`)
    pub collection: ManifestPath,
    /// Directory holding one child per entity
    pub children_dir: ManifestPath,
    /// How each child is materialized
    pub child_kind: ChildKind,
}

impl LevelSpec {
    /// Path of the child materializing entity `id`
    pub fn child_path(&self, id: &str) -> Result<ManifestPath, DomainError> {
        match self.child_kind {
            ChildKind::Directory => self.children_dir.join(id),
            ChildKind::Record => self.children_dir.join(&format!("{id}{RECORD_SUFFIX}")),
        }
    }
}

// ============================================================================
// Handler contract
// ============================================================================

/// One remote entity, classified against the cache
#[derive(Debug, Clone)]
pub struct Change {
    /// Identifier (`slug`)
    pub id: Slug,
    /// Path of the child materializing this entity
    pub path: ManifestPath,
    /// The entity as listed remotely
    pub current: Record,
    /// The entity as listed in the cached snapshot, if materialized
    pub cached: Option<Record>,
    /// `Created`, `Updated` or `Unchanged`
    pub status: SyncOutcome,
}

/// What a handler did with one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    /// Outcome for the entity itself
    pub outcome: SyncOutcome,
    /// False when part of the entity's subtree failed and must be retried
    pub complete: bool,
}

impl Applied {
    #[must_use]
    pub fn complete(outcome: SyncOutcome) -> Self {
        Self {
            outcome,
            complete: true,
        }
    }

    #[must_use]
    pub fn incomplete(outcome: SyncOutcome) -> Self {
        Self {
            outcome,
            complete: false,
        }
    }
}

/// Per-entity continuation invoked by the level synchronizer
///
/// Implementations fetch and persist detail and recurse into child levels.
#[async_trait]
pub trait EntityHandler: Send + Sync {
    async fn apply(&self, change: &Change) -> Result<Applied, SyncError>;
}

/// Result of reconciling one level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSummary {
    /// Every entity was applied completely
    pub complete: bool,
    /// Work was left undone because the run was cancelled
    pub cancelled: bool,
}

// ============================================================================
// LevelSynchronizer
// ============================================================================

/// A remote entity waiting to be processed
struct Pending {
    position: usize,
    id: Slug,
    path: ManifestPath,
    current: Record,
    cached: Option<Record>,
}

/// A processed entity, with the records needed to build the new listing
struct Processed {
    path: ManifestPath,
    label: String,
    current: Record,
    cached: Option<Record>,
    result: Result<Applied, SyncError>,
}

/// Generic diff/apply algorithm shared by every level
pub struct LevelSynchronizer<'a> {
    store: &'a dyn IManifestStore,
    recorder: &'a SyncRecorder,
    cancel: &'a CancellationToken,
    concurrency: usize,
}

impl<'a> LevelSynchronizer<'a> {
    pub fn new(
        store: &'a dyn IManifestStore,
        recorder: &'a SyncRecorder,
        cancel: &'a CancellationToken,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            recorder,
            cancel,
            concurrency: concurrency.max(1),
        }
    }

    /// Reconcile `remote` against the cache at `spec`
    ///
    /// # Errors
    /// Only fatal errors (storage) are returned; per-entity failures are
    /// logged, recorded and reflected in [`LevelSummary::complete`].
    #[tracing::instrument(skip_all, fields(kind = %spec.kind, collection = %spec.collection))]
    pub async fn reconcile(
        &self,
        spec: &LevelSpec,
        remote: Snapshot,
        handler: &dyn EntityHandler,
    ) -> Result<LevelSummary, SyncError> {
        if self.cancel.is_cancelled() {
            self.recorder.cancelled();
            return Ok(LevelSummary {
                complete: false,
                cancelled: true,
            });
        }

        let cached_ids = self
            .store
            .list_child_ids(&spec.children_dir, spec.child_kind)
            .await?;
        let cached_list = self.store.read_collection(&spec.collection).await?;
        debug!(
            remote = remote.len(),
            materialized = cached_ids.len(),
            has_cached_list = cached_list.is_some(),
            "reconciling"
        );

        let pending = self.pending(spec, remote, &cached_ids, cached_list.as_ref());

        // Deletion pass, strictly before any per-entity work.
        let remote_ids: BTreeSet<&str> = pending.iter().map(|p| p.id.as_str()).collect();
        for orphan in cached_ids.iter().filter(|id| !remote_ids.contains(id.as_str())) {
            let path = match spec.child_path(orphan) {
                Ok(path) => path,
                Err(e) => {
                    warn!(id = %orphan, error = %e, "cannot address cached child, leaving it");
                    continue;
                }
            };
            warn!(kind = %spec.kind, path = %path, "removed");
            self.store.delete_subtree(&path).await?;
            self.recorder.event(spec.kind, &path, SyncOutcome::Removed);
        }

        // Per-entity pass.
        let total = pending.len();
        let results = stream::iter(pending)
            .map(|p| self.process(spec.kind, total, p, handler))
            .buffered(self.concurrency);
        let mut results = std::pin::pin!(results);

        let mut persisted = Vec::with_capacity(total);
        let mut complete = true;
        let mut cancelled = false;

        while let Some(processed) = results.next().await {
            let Processed {
                path,
                label,
                current,
                cached,
                result,
            } = processed;

            match result {
                Ok(applied) if applied.complete => {
                    self.recorder.event(spec.kind, &path, applied.outcome);
                    persisted.push(current);
                }
                Ok(_) => {
                    complete = false;
                    persisted.extend(cached);
                }
                Err(SyncError::Cancelled) => {
                    cancelled = true;
                    self.recorder.skipped();
                    persisted.extend(cached);
                }
                Err(e) if e.is_fatal() => {
                    error!(kind = %spec.kind, path = %path, error = %e, "aborting");
                    return Err(e);
                }
                Err(e) => {
                    warn!(kind = %spec.kind, entity = %label, path = %path, error = %e, "failed, skipping");
                    self.recorder.error(format!("{} {path}: {e}", spec.kind));
                    complete = false;
                    persisted.extend(cached);
                }
            }
        }

        if cancelled || self.cancel.is_cancelled() {
            self.recorder.cancelled();
            debug!("cancelled, listing not written");
            return Ok(LevelSummary {
                complete: false,
                cancelled: true,
            });
        }

        let snapshot = Snapshot::new(persisted);
        if cached_list.as_ref() == Some(&snapshot) {
            debug!("listing unchanged");
        } else {
            self.store
                .write_collection(&spec.collection, &snapshot)
                .await?;
            debug!(len = snapshot.len(), "listing written");
        }

        Ok(LevelSummary {
            complete,
            cancelled: false,
        })
    }

    /// Validate identifiers and pair each remote entity with its counterpart
    fn pending(
        &self,
        spec: &LevelSpec,
        remote: Snapshot,
        cached_ids: &BTreeSet<String>,
        cached_list: Option<&Snapshot>,
    ) -> Vec<Pending> {
        let mut seen = BTreeSet::new();
        let mut pending = Vec::with_capacity(remote.len());

        for current in remote.into_records() {
            let addressed = current
                .slug(fields::ID)
                .and_then(|id| spec.child_path(id.as_str()).map(|path| (id, path)));
            let (id, path) = match addressed {
                Ok(addressed) => addressed,
                Err(e) => {
                    warn!(kind = %spec.kind, entity = %current.label(), error = %e, "no usable identifier, skipping");
                    self.recorder
                        .error(format!("{} '{}': {e}", spec.kind, current.label()));
                    continue;
                }
            };
            if path == spec.collection {
                warn!(kind = %spec.kind, id = %id, "identifier collides with the listing file, skipping");
                self.recorder
                    .error(format!("{} {path}: identifier collides with the listing file", spec.kind));
                continue;
            }
            if !seen.insert(id.clone()) {
                warn!(kind = %spec.kind, id = %id, "duplicate identifier in remote listing, keeping the first");
                self.recorder.skipped();
                continue;
            }

            // A listed counterpart only counts when its child is on disk.
            let cached = if cached_ids.contains(id.as_str()) {
                cached_list
                    .and_then(|list| list.find(fields::ID, id.as_str()))
                    .cloned()
            } else {
                None
            };

            pending.push(Pending {
                position: pending.len() + 1,
                id,
                path,
                current,
                cached,
            });
        }

        pending
    }

    async fn process(
        &self,
        kind: EntityKind,
        total: usize,
        pending: Pending,
        handler: &dyn EntityHandler,
    ) -> Processed {
        let Pending {
            position,
            id,
            path,
            current,
            cached,
        } = pending;
        let label = current.label().to_string();

        let result = if self.cancel.is_cancelled() {
            Err(SyncError::Cancelled)
        } else {
            match classify(cached.as_ref(), &current) {
                Ok(status) => {
                    let change = Change {
                        id,
                        path: path.clone(),
                        current: current.clone(),
                        cached: cached.clone(),
                        status,
                    };
                    let result = handler.apply(&change).await;
                    if let Ok(applied) = &result {
                        match applied.outcome {
                            SyncOutcome::Created | SyncOutcome::Updated => info!(
                                kind = %kind,
                                outcome = %applied.outcome,
                                "{label} ({position}/{total})"
                            ),
                            _ => debug!(
                                kind = %kind,
                                outcome = %applied.outcome,
                                "{label} ({position}/{total})"
                            ),
                        }
                    }
                    result
                }
                Err(e) => Err(e.into()),
            }
        };

        Processed {
            path,
            label,
            current,
            cached,
            result,
        }
    }
}

/// Created when there is no counterpart, Updated when the remote timestamp
/// is at least one whole second ahead, Unchanged otherwise
fn classify(cached: Option<&Record>, current: &Record) -> Result<SyncOutcome, DomainError> {
    let Some(cached) = cached else {
        return Ok(SyncOutcome::Created);
    };
    if is_newer(cached, current, fields::UPDATED_AT)? {
        Ok(SyncOutcome::Updated)
    } else {
        Ok(SyncOutcome::Unchanged)
    }
}
