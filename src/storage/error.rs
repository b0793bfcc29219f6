//! Storage layer error types
//!
//! The engine's own operations report "nothing found" through sentinels
//! (`false`, an empty list); these errors back the strict lookups those
//! sentinels are built on, and give front ends something precise to print.

use thiserror::Error;

/// the main error type for storage operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// no commit with this id is reachable from HEAD or any branch
    #[error("commit not found: {0}")]
    CommitNotFound(String),

    /// the named branch was not found
    #[error("branch not found: {0}")]
    BranchNotFound(String),

    /// the branch exists but has no commits yet
    #[error("branch has no commits: {0}")]
    UnbornBranch(String),

    /// HEAD points at nothing (no commits on the current branch)
    #[error("repository is empty: no commits found")]
    EmptyRepository,
}

/// result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
