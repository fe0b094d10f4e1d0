//! In-memory manifest store
//!
//! Same contract as [`FileManifestStore`](crate::FileManifestStore), backed by
//! a map. Directories are implied by the paths of stored entries, exactly as
//! they would be on disk. Counts writes so tests can assert idempotence, and
//! can be told to fail writes to exercise storage-failure handling.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use docmirror_core::domain::{ManifestPath, Record, Snapshot};
use docmirror_core::ports::{ChildKind, IManifestStore, StoreError, RECORD_SUFFIX};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Json(Value),
    Text(String),
}

/// Map-backed [`IManifestStore`] for tests
#[derive(Debug, Default)]
pub struct InMemoryManifestStore {
    entries: Mutex<BTreeMap<ManifestPath, Entry>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl InMemoryManifestStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of write operations (records, collections, text) so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Reset the write counter, e.g. after seeding
    pub fn reset_write_count(&self) {
        self.writes.store(0, Ordering::SeqCst);
    }

    /// Make every subsequent write fail with an I/O error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// All stored paths, sorted
    pub fn paths(&self) -> Vec<String> {
        self.lock().keys().map(ToString::to_string).collect()
    }

    /// Returns true if something is stored at exactly `path`
    pub fn contains(&self, path: &str) -> bool {
        ManifestPath::new(path)
            .map(|p| self.lock().contains_key(&p))
            .unwrap_or(false)
    }

    /// The stored text artifact at `path`, if any
    pub fn text(&self, path: &str) -> Option<String> {
        let p = ManifestPath::new(path).ok()?;
        match self.lock().get(&p) {
            Some(Entry::Text(text)) => Some(text.clone()),
            _ => None,
        }
    }

    /// The stored JSON value at `path`, if any
    pub fn json(&self, path: &str) -> Option<Value> {
        let p = ManifestPath::new(path).ok()?;
        match self.lock().get(&p) {
            Some(Entry::Json(value)) => Some(value.clone()),
            _ => None,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<ManifestPath, Entry>> {
        // A poisoned lock only means another test thread panicked mid-insert;
        // the map itself is still consistent.
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn put(&self, path: &ManifestPath, entry: Entry) -> Result<(), StoreError> {
        if path.is_root() {
            return Err(StoreError::InvalidPath(
                "cannot write to the store root".to_string(),
            ));
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::Other, "simulated write failure"),
            ));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.lock().insert(path.clone(), entry);
        Ok(())
    }

    fn get_json(&self, path: &ManifestPath) -> Result<Option<Value>, StoreError> {
        match self.lock().get(path) {
            Some(Entry::Json(value)) => Ok(Some(value.clone())),
            Some(Entry::Text(_)) => Err(StoreError::serialization(path, "not a JSON entry")),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl IManifestStore for InMemoryManifestStore {
    async fn read_record(&self, path: &ManifestPath) -> Result<Option<Record>, StoreError> {
        self.get_json(path)?
            .map(Record::from_value)
            .transpose()
            .map_err(|e| StoreError::serialization(path, e))
    }

    async fn read_collection(&self, path: &ManifestPath) -> Result<Option<Snapshot>, StoreError> {
        self.get_json(path)?
            .map(Snapshot::from_value)
            .transpose()
            .map_err(|e| StoreError::serialization(path, e))
    }

    async fn list_child_ids(
        &self,
        parent: &ManifestPath,
        kind: ChildKind,
    ) -> Result<BTreeSet<String>, StoreError> {
        let depth = parent.segments().count();
        let mut ids = BTreeSet::new();

        for key in self.lock().keys() {
            if !key.starts_with(parent) {
                continue;
            }
            let mut rest = key.segments().skip(depth);
            let Some(child) = rest.next() else {
                continue;
            };
            let is_dir = rest.next().is_some();

            match kind {
                ChildKind::Directory if is_dir => {
                    ids.insert(child.to_string());
                }
                ChildKind::Record if !is_dir => {
                    if let Some(stem) = child.strip_suffix(RECORD_SUFFIX) {
                        if !stem.is_empty() {
                            ids.insert(stem.to_string());
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(ids)
    }

    async fn write_record(&self, path: &ManifestPath, record: &Record) -> Result<(), StoreError> {
        self.put(path, Entry::Json(record.clone().into_value()))
    }

    async fn write_collection(
        &self,
        path: &ManifestPath,
        snapshot: &Snapshot,
    ) -> Result<(), StoreError> {
        let value = serde_json::to_value(snapshot).map_err(|e| StoreError::serialization(path, e))?;
        self.put(path, Entry::Json(value))
    }

    async fn write_text(&self, path: &ManifestPath, text: &str) -> Result<(), StoreError> {
        self.put(path, Entry::Text(text.to_string()))
    }

    async fn delete_subtree(&self, path: &ManifestPath) -> Result<(), StoreError> {
        if path.is_root() {
            return Err(StoreError::InvalidPath(
                "refusing to delete the store root".to_string(),
            ));
        }
        self.lock().retain(|key, _| !key.starts_with(path));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn path(p: &str) -> ManifestPath {
        ManifestPath::new(p).unwrap()
    }

    #[tokio::test]
    async fn test_directories_are_implied_by_entries() {
        let store = InMemoryManifestStore::new();
        let doc = Record::from_value(json!({"slug": "intro"})).unwrap();
        store
            .write_record(&path("alice/notes/docs/intro.json"), &doc)
            .await
            .unwrap();
        store
            .write_collection(&path("alice/repos.json"), &Snapshot::default())
            .await
            .unwrap();

        let repos = store
            .list_child_ids(&path("alice"), ChildKind::Directory)
            .await
            .unwrap();
        assert_eq!(repos.into_iter().collect::<Vec<_>>(), vec!["notes"]);

        let records = store
            .list_child_ids(&path("alice"), ChildKind::Record)
            .await
            .unwrap();
        assert_eq!(records.into_iter().collect::<Vec<_>>(), vec!["repos"]);

        let docs = store
            .list_child_ids(&path("alice/notes/docs"), ChildKind::Record)
            .await
            .unwrap();
        assert_eq!(docs.into_iter().collect::<Vec<_>>(), vec!["intro"]);
    }

    #[tokio::test]
    async fn test_delete_subtree_removes_prefix_only() {
        let store = InMemoryManifestStore::new();
        store.write_text(&path("alice/notes/toc.yaml"), "a").await.unwrap();
        store.write_text(&path("alice/notes2/toc.yaml"), "b").await.unwrap();

        store.delete_subtree(&path("alice/notes")).await.unwrap();

        assert_eq!(store.paths(), vec!["alice/notes2/toc.yaml".to_string()]);
        assert_eq!(store.text("alice/notes2/toc.yaml").as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_write_counter_and_failures() {
        let store = InMemoryManifestStore::new();
        store.write_text(&path("a.txt"), "x").await.unwrap();
        assert_eq!(store.write_count(), 1);

        store.set_fail_writes(true);
        let err = store.write_text(&path("b.txt"), "y").await.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert_eq!(store.write_count(), 1);
        assert!(!store.contains("b.txt"));

        store.reset_write_count();
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_reading_text_as_record_fails() {
        let store = InMemoryManifestStore::new();
        store.write_text(&path("toc.yaml"), "- a").await.unwrap();
        assert!(store.read_record(&path("toc.yaml")).await.is_err());
    }
}
