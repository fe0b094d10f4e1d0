//! File-backed manifest store (secondary/driven adapter)
//!
//! Implements [`IManifestStore`] using `tokio::fs`. Every manifest path maps
//! to a file or directory under the configured base directory.
//!
//! ## Design Decisions
//!
//! - **Atomic writes**: Uses write-to-temp + rename so a reader never sees a
//!   half-written record.
//! - **Pretty JSON**: Records and snapshots are stored with 2-space indent so
//!   the cache stays diffable.
//! - **Missing is not an error**: Reads, listings and deletions of absent
//!   paths succeed with `None`, an empty set, or a no-op.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use docmirror_core::domain::{ManifestPath, Record, Snapshot};
use docmirror_core::ports::{ChildKind, IManifestStore, StoreError, RECORD_SUFFIX};
use serde_json::Value;
use tracing::{debug, instrument};

/// Suffix of in-flight temporary files
const TMP_SUFFIX: &str = ".tmp";

/// Adapter that stores the manifest as files below `base_dir`
#[derive(Debug, Clone)]
pub struct FileManifestStore {
    base_dir: PathBuf,
}

impl FileManifestStore {
    /// Create a store rooted at `base_dir` (created lazily on first write)
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// The directory this store writes into
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve a manifest path to a filesystem path
    #[must_use]
    pub fn resolve(&self, path: &ManifestPath) -> PathBuf {
        path.segments()
            .fold(self.base_dir.clone(), |acc, segment| acc.join(segment))
    }

    async fn read_json(&self, path: &ManifestPath) -> Result<Option<Value>, StoreError> {
        let file = self.resolve(path);
        let bytes = match tokio::fs::read(&file).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("not cached");
                return Ok(None);
            }
            Err(e) => return Err(StoreError::io(path, e)),
        };
        let value = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::serialization(path, e))?;
        Ok(Some(value))
    }

    async fn write_bytes(&self, path: &ManifestPath, data: &[u8]) -> Result<(), StoreError> {
        if path.is_root() {
            return Err(StoreError::InvalidPath(
                "cannot write to the store root".to_string(),
            ));
        }
        let target = self.resolve(path);

        // Ensure parent directory exists.
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(path, e))?;
        }

        // Write to a temporary file in the same directory so rename is atomic
        // (same filesystem).
        let tmp_path = {
            let mut p = target.as_os_str().to_owned();
            p.push(TMP_SUFFIX);
            PathBuf::from(p)
        };

        debug!(?tmp_path, bytes = data.len(), "writing to temporary file");
        tokio::fs::write(&tmp_path, data)
            .await
            .map_err(|e| StoreError::io(path, e))?;

        if let Err(e) = tokio::fs::rename(&tmp_path, &target).await {
            // Best effort: do not leave the temp file behind.
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(StoreError::io(path, e));
        }

        debug!("write complete");
        Ok(())
    }

    async fn write_json<T: serde::Serialize + ?Sized>(
        &self,
        path: &ManifestPath,
        value: &T,
    ) -> Result<(), StoreError> {
        let data =
            serde_json::to_vec_pretty(value).map_err(|e| StoreError::serialization(path, e))?;
        self.write_bytes(path, &data).await
    }
}

#[async_trait]
impl IManifestStore for FileManifestStore {
    #[instrument(skip(self), fields(path = %path))]
    async fn read_record(&self, path: &ManifestPath) -> Result<Option<Record>, StoreError> {
        match self.read_json(path).await? {
            Some(value) => Record::from_value(value)
                .map(Some)
                .map_err(|e| StoreError::serialization(path, e)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn read_collection(&self, path: &ManifestPath) -> Result<Option<Snapshot>, StoreError> {
        match self.read_json(path).await? {
            Some(value) => Snapshot::from_value(value)
                .map(Some)
                .map_err(|e| StoreError::serialization(path, e)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(parent = %parent))]
    async fn list_child_ids(
        &self,
        parent: &ManifestPath,
        kind: ChildKind,
    ) -> Result<BTreeSet<String>, StoreError> {
        let dir = self.resolve(parent);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(BTreeSet::new());
            }
            Err(e) => return Err(StoreError::io(parent, e)),
        };

        let mut ids = BTreeSet::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(parent, e))?
        {
            let Ok(name) = entry.file_name().into_string() else {
                debug!(name = ?entry.file_name(), "skipping non UTF-8 entry");
                continue;
            };
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| StoreError::io(parent, e))?;

            match kind {
                ChildKind::Directory if file_type.is_dir() => {
                    ids.insert(name);
                }
                ChildKind::Record if file_type.is_file() => {
                    if let Some(stem) = name.strip_suffix(RECORD_SUFFIX) {
                        if !stem.is_empty() {
                            ids.insert(stem.to_string());
                        }
                    }
                }
                _ => {}
            }
        }

        debug!(count = ids.len(), "listed children");
        Ok(ids)
    }

    #[instrument(skip(self, record), fields(path = %path))]
    async fn write_record(&self, path: &ManifestPath, record: &Record) -> Result<(), StoreError> {
        self.write_json(path, record).await
    }

    #[instrument(skip(self, snapshot), fields(path = %path, len = snapshot.len()))]
    async fn write_collection(
        &self,
        path: &ManifestPath,
        snapshot: &Snapshot,
    ) -> Result<(), StoreError> {
        self.write_json(path, snapshot).await
    }

    #[instrument(skip(self, text), fields(path = %path, bytes = text.len()))]
    async fn write_text(&self, path: &ManifestPath, text: &str) -> Result<(), StoreError> {
        self.write_bytes(path, text.as_bytes()).await
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn delete_subtree(&self, path: &ManifestPath) -> Result<(), StoreError> {
        if path.is_root() {
            return Err(StoreError::InvalidPath(
                "refusing to delete the store root".to_string(),
            ));
        }
        let target = self.resolve(path);
        let metadata = match tokio::fs::symlink_metadata(&target).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("nothing to delete");
                return Ok(());
            }
            Err(e) => return Err(StoreError::io(path, e)),
        };

        let result = if metadata.is_dir() {
            debug!("removing directory recursively");
            tokio::fs::remove_dir_all(&target).await
        } else {
            debug!("removing file");
            tokio::fs::remove_file(&target).await
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }
}

// ============================================================================
// Unit tests
// ============================================================================
