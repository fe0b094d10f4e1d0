//! Run options and the run report

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use docmirror_core::config::SyncConfig;
use docmirror_core::domain::{EntityKind, ManifestPath, SyncOutcome};
use serde::Serialize;

/// Tunables for one synchronization run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Maximum remote fetches in flight at once (1 = strictly sequential)
    pub concurrency: usize,
    /// Skip a repository's documents when its own timestamp has not advanced
    pub trust_repository_timestamps: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            trust_repository_timestamps: false,
        }
    }
}

impl SyncOptions {
    /// Options from the `sync` configuration section
    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            trust_repository_timestamps: config.trust_repository_timestamps,
        }
    }
}

/// One applied change (or confirmed no-op) to the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncEvent {
    /// Kind of entity
    pub kind: EntityKind,
    /// Manifest path of the entity's record or directory
    pub path: String,
    /// What happened to it
    pub outcome: SyncOutcome,
}

/// Summary of a completed synchronization run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    /// Login of the mirrored account, once known
    pub login: Option<String>,
    /// Entities fetched and written for the first time
    pub created: usize,
    /// Entities whose cached record was replaced
    pub updated: usize,
    /// Entities confirmed current
    pub unchanged: usize,
    /// Orphans deleted from the cache
    pub removed: usize,
    /// Entities not processed (duplicates, cancellation)
    pub skipped: usize,
    /// Non-fatal per-entity errors
    pub errors: Vec<String>,
    /// Every event, in the order it was recorded
    pub events: Vec<SyncEvent>,
    /// Whether the run was cut short by cancellation
    pub cancelled: bool,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
}

impl SyncReport {
    /// Number of cache mutations (created + updated + removed)
    #[must_use]
    pub fn changes(&self) -> usize {
        self.created + self.updated + self.removed
    }

    /// Events of one kind with one outcome, as paths
    pub fn paths(&self, kind: EntityKind, outcome: SyncOutcome) -> Vec<&str> {
        self.events
            .iter()
            .filter(|e| e.kind == kind && e.outcome == outcome)
            .map(|e| e.path.as_str())
            .collect()
    }
}

/// Thread-safe accumulator for a [`SyncReport`]
///
/// Shared by reference between concurrently processed entities.
#[derive(Debug, Default)]
pub struct SyncRecorder {
    report: Mutex<SyncReport>,
}

impl SyncRecorder {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SyncReport> {
        self.report.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the login of the mirrored account
    pub fn set_login(&self, login: &str) {
        self.lock().login = Some(login.to_string());
    }

    /// Record what happened to one entity
    pub fn event(&self, kind: EntityKind, path: &ManifestPath, outcome: SyncOutcome) {
        let mut report = self.lock();
        match outcome {
            SyncOutcome::Created => report.created += 1,
            SyncOutcome::Updated => report.updated += 1,
            SyncOutcome::Unchanged => report.unchanged += 1,
            SyncOutcome::Removed => report.removed += 1,
        }
        report.events.push(SyncEvent {
            kind,
            path: path.to_string(),
            outcome,
        });
    }

    /// Record a non-fatal error
    pub fn error(&self, message: impl Into<String>) {
        self.lock().errors.push(message.into());
    }

    /// Record an entity that was not processed
    pub fn skipped(&self) {
        self.lock().skipped += 1;
    }

    /// Mark the run as cancelled
    pub fn cancelled(&self) {
        self.lock().cancelled = true;
    }

    /// Finish the run and take the report
    pub fn finish(self, started: Instant) -> SyncReport {
        let mut report = self
            .report
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        report.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(p: &str) -> ManifestPath {
        ManifestPath::new(p).unwrap()
    }

    #[test]
    fn test_recorder_counts_outcomes() {
        let recorder = SyncRecorder::new();
        recorder.event(EntityKind::Account, &path("user.json"), SyncOutcome::Created);
        recorder.event(
            EntityKind::Repository,
            &path("alice/notes"),
            SyncOutcome::Unchanged,
        );
        recorder.event(EntityKind::Repository, &path("alice/old"), SyncOutcome::Removed);
        recorder.error("document alice/notes/docs/x.json: boom");
        recorder.skipped();

        let report = recorder.finish(Instant::now());
        assert_eq!(report.created, 1);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.removed, 1);
        assert_eq!(report.changes(), 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(
            report.paths(EntityKind::Repository, SyncOutcome::Removed),
            vec!["alice/old"]
        );
        assert!(!report.cancelled);
    }

    #[test]
    fn test_options_from_config() {
        let config = SyncConfig {
            concurrency: 0,
            trust_repository_timestamps: true,
        };
        let options = SyncOptions::from_config(&config);
        assert_eq!(options.concurrency, 1);
        assert!(options.trust_repository_timestamps);
    }

    #[test]
    fn test_report_serializes_snake_case() {
        let recorder = SyncRecorder::new();
        recorder.event(
            EntityKind::Document,
            &path("alice/notes/docs/intro.json"),
            SyncOutcome::Updated,
        );
        let json = serde_json::to_value(recorder.finish(Instant::now())).unwrap();
        assert_eq!(json["events"][0]["kind"], "document");
        assert_eq!(json["events"][0]["outcome"], "updated");
        assert_eq!(json["updated"], 1);
    }
}
