//! Per-entity synchronization outcomes

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// The three entity kinds of the mirrored hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Root singleton
    Account,
    /// Child of the account, identified by slug
    Repository,
    /// Child of a repository, identified by slug
    Document,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Account => "account",
            Self::Repository => "repository",
            Self::Document => "document",
        })
    }
}

/// What happened to one entity during a sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// No cached counterpart existed; the entity was fetched and persisted
    Created,
    /// The remote timestamp was newer; the cached record was replaced
    Updated,
    /// The cached record is current
    Unchanged,
    /// The entity disappeared from the remote listing and was deleted
    Removed,
}

impl SyncOutcome {
    /// Whether this outcome mutated the cache
    #[must_use]
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

impl Display for SyncOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::Removed => "removed",
        })
    }
}
