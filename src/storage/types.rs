//! core type-safe wrappers used across the storage layer.

use std::fmt;
use std::fmt::Formatter;

use serde::{Deserialize, Serialize};

/// Identifier of a commit.
///
/// Ids are opaque strings handed out by an [`IdGenerator`](crate::storage::IdGenerator);
/// the only property the engine relies on is uniqueness within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    /// number of characters kept by [`CommitId::short`]
    pub const SHORT_LEN: usize = 8;

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// short form of the commit ID (at most 8 characters)
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(Self::SHORT_LEN) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// branch naming helpers
///
/// Branch names are plain strings: the engine accepts any name, including
/// the empty one, and never validates them.
pub struct BranchName;

impl BranchName {
    /// the branch a freshly initialized repository starts on
    pub const DEFAULT: &'static str = "master";
}
