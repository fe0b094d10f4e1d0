//! Shared fixtures for engine tests: a scripted in-memory remote source.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use docmirror_cache::InMemoryManifestStore;
use docmirror_core::domain::{Namespace, Record, Slug, Snapshot};
use docmirror_core::ports::{IManifestStore, IRemoteSource, RemoteError};
use docmirror_sync::{SyncEngine, SyncOptions};

pub const LOGIN: &str = "alice";

/// `2024-01-01T00:MM:SS.000Z`, `secs` seconds after midnight (< 3600)
pub fn ts(secs: u32) -> String {
    format!("2024-01-01T00:{:02}:{:02}.000Z", secs / 60, secs % 60)
}

/// Baseline timestamp used by most fixtures
pub const T0: u32 = 600;

#[derive(Default)]
struct State {
    account: Value,
    repos: Vec<Value>,
    repo_details: HashMap<String, Value>,
    docs: HashMap<String, Vec<Value>>,
    doc_details: HashMap<(String, String), Value>,
    failures: HashSet<String>,
    delays: HashMap<String, Duration>,
    cancel_on: Option<(String, CancellationToken)>,
    calls: Vec<String>,
}

/// Remote source scripted from test code
///
/// Every call is logged under a key: `account`, `repos`, `repo:{repo}`,
/// `docs:{repo}`, `doc:{repo}/{doc}`. A key can be made to fail, to sleep
/// first, or to cancel a token when called.
pub struct FakeRemoteSource {
    state: Mutex<State>,
}

impl FakeRemoteSource {
    pub fn new() -> Self {
        let state = State {
            account: json!({"id": 1, "login": LOGIN, "name": "Alice", "updated_at": ts(T0)}),
            ..State::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn set_account(&self, account: Value) {
        self.with(|s| s.account = account);
    }

    /// Add (or replace) a repository listed and detailed at `updated_at`
    pub fn add_repo(&self, slug: &str, updated_at: u32) {
        self.with(|s| {
            let entry = json!({
                "slug": slug,
                "name": format!("Repo {slug}"),
                "namespace": format!("{LOGIN}/{slug}"),
                "updated_at": ts(updated_at),
            });
            match s.repos.iter_mut().find(|r| r["slug"] == slug) {
                Some(existing) => *existing = entry,
                None => s.repos.push(entry),
            }
            s.repo_details.insert(
                slug.to_string(),
                json!({
                    "slug": slug,
                    "name": format!("Repo {slug}"),
                    "updated_at": ts(updated_at),
                    "toc_yml": format!("- type: META\n  count: 0\n# {slug} @ {updated_at}\n"),
                }),
            );
            s.docs.entry(slug.to_string()).or_default();
        });
    }

    pub fn remove_repo(&self, slug: &str) {
        self.with(|s| s.repos.retain(|r| r["slug"] != slug));
    }

    /// Add (or replace) a document listed and detailed at `updated_at`
    pub fn add_doc(&self, repo: &str, slug: &str, updated_at: u32) {
        self.with(|s| {
            let entry = json!({"slug": slug, "title": format!("Doc {slug}"), "updated_at": ts(updated_at)});
            let docs = s.docs.entry(repo.to_string()).or_default();
            match docs.iter_mut().find(|d| d["slug"] == slug) {
                Some(existing) => *existing = entry,
                None => docs.push(entry),
            }
            s.doc_details.insert(
                (repo.to_string(), slug.to_string()),
                json!({
                    "slug": slug,
                    "title": format!("Doc {slug}"),
                    "updated_at": ts(updated_at),
                    "body": format!("body of {slug} @ {updated_at}"),
                }),
            );
        });
    }

    /// Append a raw document list entry (no detail)
    pub fn push_raw_doc(&self, repo: &str, entry: Value) {
        self.with(|s| s.docs.entry(repo.to_string()).or_default().push(entry));
    }

    pub fn remove_doc(&self, repo: &str, slug: &str) {
        self.with(|s| {
            if let Some(docs) = s.docs.get_mut(repo) {
                docs.retain(|d| d["slug"] != slug);
            }
        });
    }

    pub fn fail(&self, key: &str) {
        self.with(|s| s.failures.insert(key.to_string()));
    }

    pub fn heal(&self, key: &str) {
        self.with(|s| s.failures.remove(key));
    }

    pub fn delay(&self, key: &str, delay: Duration) {
        self.with(|s| s.delays.insert(key.to_string(), delay));
    }

    pub fn cancel_on(&self, key: &str, token: CancellationToken) {
        self.with(|s| s.cancel_on = Some((key.to_string(), token)));
    }

    pub fn calls(&self) -> Vec<String> {
        self.with(|s| s.calls.clone())
    }

    pub fn called(&self, key: &str) -> usize {
        self.with(|s| s.calls.iter().filter(|c| *c == key).count())
    }

    pub fn clear_calls(&self) {
        self.with(|s| s.calls.clear());
    }

    async fn call<T>(
        &self,
        key: String,
        answer: impl FnOnce(&State) -> Option<Value>,
        convert: impl FnOnce(Value) -> T,
    ) -> Result<T, RemoteError> {
        let (delay, failing, value) = self.with(|s| {
            s.calls.push(key.clone());
            if let Some((on, token)) = &s.cancel_on {
                if *on == key {
                    token.cancel();
                }
            }
            (
                s.delays.get(&key).copied(),
                s.failures.contains(&key),
                answer(s),
            )
        });

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if failing {
            return Err(RemoteError::RequestFailed {
                status: 500,
                body: format!("scripted failure for {key}"),
            });
        }
        value.map(convert).ok_or(RemoteError::RequestFailed {
            status: 404,
            body: format!("no such entity: {key}"),
        })
    }
}

#[async_trait]
impl IRemoteSource for FakeRemoteSource {
    async fn fetch_account(&self, _user: Option<&str>) -> Result<Record, RemoteError> {
        self.call(
            "account".to_string(),
            |s| Some(s.account.clone()),
            |v| Record::from_value(v).unwrap(),
        )
        .await
    }

    async fn fetch_repositories(&self, _login: &Slug) -> Result<Snapshot, RemoteError> {
        self.call(
            "repos".to_string(),
            |s| Some(Value::Array(s.repos.clone())),
            |v| Snapshot::from_value(v).unwrap(),
        )
        .await
    }

    async fn fetch_repository_detail(&self, namespace: &Namespace) -> Result<Record, RemoteError> {
        let repo = namespace.slug().to_string();
        self.call(
            format!("repo:{repo}"),
            |s| s.repo_details.get(&repo).cloned(),
            |v| Record::from_value(v).unwrap(),
        )
        .await
    }

    async fn fetch_documents(&self, namespace: &Namespace) -> Result<Snapshot, RemoteError> {
        let repo = namespace.slug().to_string();
        self.call(
            format!("docs:{repo}"),
            |s| s.docs.get(&repo).cloned().map(Value::Array),
            |v| Snapshot::from_value(v).unwrap(),
        )
        .await
    }

    async fn fetch_document_detail(
        &self,
        namespace: &Namespace,
        slug: &Slug,
    ) -> Result<Record, RemoteError> {
        let repo = namespace.slug().to_string();
        let doc = slug.to_string();
        self.call(
            format!("doc:{repo}/{doc}"),
            |s| s.doc_details.get(&(repo.clone(), doc.clone())).cloned(),
            |v| Record::from_value(v).unwrap(),
        )
        .await
    }
}

/// Remote with repositories `notes` (docs `intro`, `setup`) and `diary`
/// (doc `day1`), all at [`T0`]
pub fn sample_remote() -> Arc<FakeRemoteSource> {
    let remote = FakeRemoteSource::new();
    remote.add_repo("notes", T0);
    remote.add_doc("notes", "intro", T0);
    remote.add_doc("notes", "setup", T0);
    remote.add_repo("diary", T0);
    remote.add_doc("diary", "day1", T0);
    Arc::new(remote)
}

pub fn engine(
    remote: &Arc<FakeRemoteSource>,
    store: &Arc<InMemoryManifestStore>,
    options: SyncOptions,
) -> SyncEngine {
    let remote: Arc<dyn IRemoteSource> = remote.clone();
    let store: Arc<dyn IManifestStore> = store.clone();
    SyncEngine::new(remote, store, options)
}

pub fn sequential() -> SyncOptions {
    SyncOptions::default()
}

/// Snapshot of every stored path with its content, for before/after checks
pub fn dump(store: &InMemoryManifestStore) -> Vec<(String, String)> {
    store
        .paths()
        .into_iter()
        .map(|p| {
            let content = store
                .json(&p)
                .map(|v| v.to_string())
                .or_else(|| store.text(&p))
                .unwrap_or_default();
            (p, content)
        })
        .collect()
}

/// Slugs of the entries of a stored collection, in stored order
pub fn listed(store: &InMemoryManifestStore, path: &str) -> Vec<String> {
    store
        .json(path)
        .and_then(|v| v.as_array().cloned())
        .unwrap_or_default()
        .iter()
        .filter_map(|e| e["slug"].as_str().map(str::to_string))
        .collect()
}
