//! Cache layout
//!
//! ```text
//! user.json                       account record
//! {login}/repos.json              repository list
//! {login}/{repo}/repo.json        repository detail
//! {login}/{repo}/toc.yaml         table of contents, verbatim
//! {login}/{repo}/docs.json        document list
//! {login}/{repo}/docs/{doc}.json  document detail
//! ```

use docmirror_core::domain::{DomainError, ManifestPath, Namespace, Slug};

pub const ACCOUNT_FILE: &str = "user.json";
pub const REPOSITORY_LIST_FILE: &str = "repos.json";
pub const REPOSITORY_FILE: &str = "repo.json";
pub const TOC_FILE: &str = "toc.yaml";
pub const DOCUMENT_LIST_FILE: &str = "docs.json";
pub const DOCUMENTS_DIR: &str = "docs";

pub fn account_record() -> Result<ManifestPath, DomainError> {
    ManifestPath::root().join(ACCOUNT_FILE)
}

pub fn account_dir(login: &Slug) -> ManifestPath {
    ManifestPath::root().join_slug(login)
}

pub fn repository_list(login: &Slug) -> Result<ManifestPath, DomainError> {
    account_dir(login).join(REPOSITORY_LIST_FILE)
}

pub fn repository_record(namespace: &Namespace) -> Result<ManifestPath, DomainError> {
    namespace.manifest_dir().join(REPOSITORY_FILE)
}

pub fn toc(namespace: &Namespace) -> Result<ManifestPath, DomainError> {
    namespace.manifest_dir().join(TOC_FILE)
}

pub fn document_list(namespace: &Namespace) -> Result<ManifestPath, DomainError> {
    namespace.manifest_dir().join(DOCUMENT_LIST_FILE)
}

pub fn documents_dir(namespace: &Namespace) -> Result<ManifestPath, DomainError> {
    namespace.manifest_dir().join(DOCUMENTS_DIR)
}
