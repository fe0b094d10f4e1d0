//! YuqueRemoteSource - IRemoteSource implementation over [`YuqueClient`]
//!
//! Maps each port operation onto one `/api/v2` endpoint:
//!
//! | Operation | Endpoint |
//! |---|---|
//! | `fetch_account(None)` | `GET user` |
//! | `fetch_account(Some(login))` | `GET users/{login}` |
//! | `fetch_repositories` | `GET users/{login}/repos` |
//! | `fetch_repository_detail` | `GET repos/{owner}/{slug}` |
//! | `fetch_documents` | `GET repos/{owner}/{slug}/docs` |
//! | `fetch_document_detail` | `GET repos/{owner}/{slug}/docs/{doc}` |

use async_trait::async_trait;
use tracing::{debug, instrument};

use docmirror_core::config::RemoteConfig;
use docmirror_core::domain::{Namespace, Record, Slug, Snapshot};
use docmirror_core::ports::{IRemoteSource, RemoteError};

use crate::client::YuqueClient;

/// Remote source backed by the Yuque-style REST API
#[derive(Debug, Clone)]
pub struct YuqueRemoteSource {
    client: YuqueClient,
}

impl YuqueRemoteSource {
    /// Creates a new `YuqueRemoteSource` wrapping the given [`YuqueClient`]
    pub fn new(client: YuqueClient) -> Self {
        Self { client }
    }

    /// Creates a source from the `remote` configuration section
    pub fn from_config(config: &RemoteConfig) -> Result<Self, RemoteError> {
        YuqueClient::from_config(config).map(Self::new)
    }

    /// Returns the underlying client
    pub fn client(&self) -> &YuqueClient {
        &self.client
    }
}

#[async_trait]
impl IRemoteSource for YuqueRemoteSource {
    #[instrument(skip(self))]
    async fn fetch_account(&self, user: Option<&str>) -> Result<Record, RemoteError> {
        match user.filter(|u| !u.is_empty()) {
            Some(login) => self.client.get_record(&["users", login]).await,
            None => self.client.get_record(&["user"]).await,
        }
    }

    #[instrument(skip(self), fields(login = %login))]
    async fn fetch_repositories(&self, login: &Slug) -> Result<Snapshot, RemoteError> {
        let repos = self
            .client
            .get_snapshot(&["users", login.as_str(), "repos"])
            .await?;
        debug!(count = repos.len(), "fetched repository list");
        Ok(repos)
    }

    #[instrument(skip(self), fields(namespace = %namespace))]
    async fn fetch_repository_detail(&self, namespace: &Namespace) -> Result<Record, RemoteError> {
        self.client
            .get_record(&["repos", namespace.owner().as_str(), namespace.slug().as_str()])
            .await
    }

    #[instrument(skip(self), fields(namespace = %namespace))]
    async fn fetch_documents(&self, namespace: &Namespace) -> Result<Snapshot, RemoteError> {
        let docs = self
            .client
            .get_snapshot(&[
                "repos",
                namespace.owner().as_str(),
                namespace.slug().as_str(),
                "docs",
            ])
            .await?;
        debug!(count = docs.len(), "fetched document list");
        Ok(docs)
    }

    #[instrument(skip(self), fields(namespace = %namespace, slug = %slug))]
    async fn fetch_document_detail(
        &self,
        namespace: &Namespace,
        slug: &Slug,
    ) -> Result<Record, RemoteError> {
        self.client
            .get_record(&[
                "repos",
                namespace.owner().as_str(),
                namespace.slug().as_str(),
                "docs",
                slug.as_str(),
            ])
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
