//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for identifiers and store
//! paths. Each newtype ensures data validity at construction time, so a slug
//! coming from the remote API can never escape the store directory.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// Slug
// ============================================================================

/// A human-readable identifier unique within its parent scope
///
/// Slugs are used verbatim as path segments in the manifest store, so they
/// must be a single, non-traversing segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Create a new Slug
    ///
    /// # Errors
    /// Returns error if the slug is empty, contains `/`, `\` or NUL, or is
    /// `.` / `..`
    pub fn new(slug: impl Into<String>) -> Result<Self, DomainError> {
        let slug = slug.into();
        validate_segment(&slug).map_err(|reason| {
            DomainError::InvalidSlug(format!("{reason}: {slug:?}"))
        })?;
        Ok(Self(slug))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Slug {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Slug {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Slug {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Namespace
// ============================================================================

/// The `account/repository-slug` pair addressing a repository
///
/// Used both for remote calls (`repos/{namespace}`) and as the cache
/// directory holding the repository's detail, toc and documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    owner: Slug,
    slug: Slug,
}

impl Namespace {
    /// Create a namespace from the owning account login and repository slug
    #[must_use]
    pub fn new(owner: Slug, slug: Slug) -> Self {
        Self { owner, slug }
    }

    /// The owning account login
    #[must_use]
    pub fn owner(&self) -> &Slug {
        &self.owner
    }

    /// The repository slug
    #[must_use]
    pub fn slug(&self) -> &Slug {
        &self.slug
    }

    /// The manifest directory of this repository (`{owner}/{slug}`)
    #[must_use]
    pub fn manifest_dir(&self) -> ManifestPath {
        ManifestPath::from_segments(vec![
            self.owner.as_str().to_string(),
            self.slug.as_str().to_string(),
        ])
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.slug)
    }
}

impl FromStr for Namespace {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, slug)) => Ok(Self::new(Slug::new(owner)?, Slug::new(slug)?)),
            None => Err(DomainError::InvalidSlug(format!(
                "Namespace must be 'owner/slug': {s:?}"
            ))),
        }
    }
}

// ============================================================================
// ManifestPath
// ============================================================================

/// A validated, relative, `/`-separated path inside the manifest store
///
/// The empty path is the store root. Segments are never empty, `.` or `..`,
/// so joining a path onto the store directory cannot escape it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ManifestPath(Vec<String>);

impl ManifestPath {
    /// Parse a manifest path such as `"alice/notes/docs.json"`
    ///
    /// # Errors
    /// Returns error if the path is absolute or contains an invalid segment
    pub fn new(path: &str) -> Result<Self, DomainError> {
        if path.starts_with('/') {
            return Err(DomainError::InvalidPath(format!(
                "Manifest path must be relative: {path}"
            )));
        }
        if path.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for segment in path.split('/') {
            validate_segment(segment)
                .map_err(|reason| DomainError::InvalidPath(format!("{reason}: {path}")))?;
            segments.push(segment.to_string());
        }
        Ok(Self(segments))
    }

    /// The store root (no segments)
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    fn from_segments(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Join a single path segment
    ///
    /// # Errors
    /// Returns error if the segment is invalid
    pub fn join(&self, segment: &str) -> Result<Self, DomainError> {
        validate_segment(segment)
            .map_err(|reason| DomainError::InvalidPath(format!("{reason}: {segment}")))?;
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Ok(Self(segments))
    }

    /// Join a slug, which is already a valid segment
    #[must_use]
    pub fn join_slug(&self, slug: &Slug) -> Self {
        let mut segments = self.0.clone();
        segments.push(slug.as_str().to_string());
        Self(segments)
    }

    /// Get the parent path (`None` for the root)
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Get the last segment (`None` for the root)
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Iterate over the path segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns true if this is the store root
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if `self` equals `other` or lies underneath it
    #[must_use]
    pub fn starts_with(&self, other: &ManifestPath) -> bool {
        self.0.len() >= other.0.len() && self.0[..other.0.len()] == other.0[..]
    }
}

impl Display for ManifestPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

impl FromStr for ManifestPath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

fn validate_segment(segment: &str) -> Result<(), &'static str> {
    if segment.is_empty() {
        return Err("empty segment");
    }
    if segment == "." || segment == ".." {
        return Err("path traversal segment");
    }
    if segment.contains(['/', '\\', '\0']) {
        return Err("segment contains a separator or NUL");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_valid() {
        let slug = Slug::new("getting-started").unwrap();
        assert_eq!(slug.as_str(), "getting-started");
        assert_eq!(slug.to_string(), "getting-started");
    }

    #[test]
    fn test_slug_rejects_invalid() {
        assert!(Slug::new("").is_err());
        assert!(Slug::new("..").is_err());
        assert!(Slug::new(".").is_err());
        assert!(Slug::new("a/b").is_err());
        assert!(Slug::new("a\\b").is_err());
        assert!(Slug::new("nul\0").is_err());
    }

    #[test]
    fn test_slug_serde_roundtrip_validates() {
        let slug: Slug = serde_json::from_str("\"intro\"").unwrap();
        assert_eq!(slug.as_str(), "intro");
        assert!(serde_json::from_str::<Slug>("\"../etc\"").is_err());
    }

    #[test]
    fn test_namespace_display_and_dir() {
        let ns = Namespace::new(Slug::new("alice").unwrap(), Slug::new("notes").unwrap());
        assert_eq!(ns.to_string(), "alice/notes");
        assert_eq!(ns.manifest_dir().to_string(), "alice/notes");
    }

    #[test]
    fn test_namespace_from_str() {
        let ns: Namespace = "alice/notes".parse().unwrap();
        assert_eq!(ns.owner().as_str(), "alice");
        assert_eq!(ns.slug().as_str(), "notes");
        assert!("alice".parse::<Namespace>().is_err());
        assert!("alice/notes/extra".parse::<Namespace>().is_err());
    }

    #[test]
    fn test_manifest_path_parse() {
        let path = ManifestPath::new("alice/notes/docs.json").unwrap();
        assert_eq!(path.to_string(), "alice/notes/docs.json");
        assert_eq!(path.file_name(), Some("docs.json"));
        assert_eq!(path.parent().unwrap().to_string(), "alice/notes");
    }

    #[test]
    fn test_manifest_path_root() {
        let root = ManifestPath::new("").unwrap();
        assert!(root.is_root());
        assert_eq!(root.parent(), None);
        assert_eq!(root.file_name(), None);
        assert_eq!(root.to_string(), "");
    }

    #[test]
    fn test_manifest_path_rejects_traversal() {
        assert!(ManifestPath::new("/abs").is_err());
        assert!(ManifestPath::new("a/../b").is_err());
        assert!(ManifestPath::new("a//b").is_err());
        assert!(ManifestPath::new("a/./b").is_err());
        assert!(ManifestPath::root().join("..").is_err());
    }

    #[test]
    fn test_manifest_path_join() {
        let dir = ManifestPath::root().join("alice").unwrap();
        let file = dir.join("repos.json").unwrap();
        assert_eq!(file.to_string(), "alice/repos.json");
        assert!(file.starts_with(&dir));
        assert!(!dir.starts_with(&file));

        let slug = Slug::new("notes").unwrap();
        assert_eq!(dir.join_slug(&slug).to_string(), "alice/notes");
    }
}
