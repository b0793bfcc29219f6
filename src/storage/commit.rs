//! Commit creation and history traversal
//!
//! commits are immutable snapshots linked to at most one parent. In twig:
//! - every commit carries the complete file map, never a delta
//! - a new commit copies its parent's files and overlays the staged entries
//! - parent links only point backwards, so the graph is a forest and
//!   history walks are simple linked-list traversals
//!
//! this module handles commit construction, ancestry walking and message formatting

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::storage::blob::BlobRef;
use crate::storage::clock::{Clock, Timestamp};
use crate::storage::ids::IdGenerator;
use crate::storage::types::CommitId;

/// file name -> content, for a commit or the staging area
pub type FileMap = BTreeMap<String, BlobRef>;

/// shared handle to an immutable commit
pub type CommitRef = Arc<Commit>;

/// An immutable snapshot of every tracked file.
pub struct Commit {
    id: CommitId,
    message: String,
    timestamp: Timestamp,
    parent: Option<CommitRef>,
    files: FileMap,
}

impl Commit {
    pub fn id(&self) -> &CommitId {
        &self.id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn parent(&self) -> Option<&CommitRef> {
        self.parent.as_ref()
    }

    /// the complete file snapshot
    pub fn files(&self) -> &FileMap {
        &self.files
    }

    /// get one file's content handle
    pub fn file(&self, name: &str) -> Option<&BlobRef> {
        self.files.get(name)
    }

    /// check if this is a root commit (has no parent)
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl fmt::Debug for Commit {
    // the parent is shown by id only; a derived impl would print the whole history
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commit")
            .field("id", &self.id)
            .field("message", &self.message)
            .field("timestamp", &self.timestamp)
            .field("parent", &self.parent.as_ref().map(|p| p.id()))
            .field("files", &self.files.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Drop for Commit {
    // unlink the chain iteratively so dropping a long history can't overflow the stack
    fn drop(&mut self) {
        let mut next = self.parent.take();
        while let Some(commit) = next {
            match Arc::try_unwrap(commit) {
                Ok(mut owned) => next = owned.parent.take(),
                Err(_) => break,
            }
        }
    }
}

/// build the file map of a new commit: the parent's files with `staged` laid over them
pub fn overlay(parent: Option<&CommitRef>, staged: &FileMap) -> FileMap {
    let mut files = parent.map(|p| p.files.clone()).unwrap_or_default();
    for (name, blob) in staged {
        files.insert(name.clone(), Arc::clone(blob));
    }
    files
}

/// builder for creating commits with a fluent interface
#[derive(Debug, Default)]
pub struct CommitBuilder {
    parent: Option<CommitRef>,
    files: FileMap,
    message: String,
}

impl CommitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// set the parent commit (none for a root)
    pub fn parent(mut self, parent: Option<CommitRef>) -> Self {
        self.parent = parent;
        self
    }

    /// set the complete file snapshot
    pub fn files(mut self, files: FileMap) -> Self {
        self.files = files;
        self
    }

    /// set the commit message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// stamp the commit with a time and a fresh id
    pub fn build(self, clock: &dyn Clock, ids: &mut dyn IdGenerator) -> CommitRef {
        let timestamp = clock.now();
        let seed = format!("{}{}", self.message, timestamp);
        let id = ids.generate(&seed);

        Arc::new(Commit {
            id,
            message: self.message,
            timestamp,
            parent: self.parent,
            files: self.files,
        })
    }
}

/// iterate over a commit and its ancestors, child to root
#[derive(Debug, Clone)]
pub struct Ancestry {
    next: Option<CommitRef>,
}

impl Iterator for Ancestry {
    type Item = CommitRef;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current.parent.clone();
        Some(current)
    }
}

/// walk history starting at `start` (an empty walk for none)
pub fn ancestry(start: Option<&CommitRef>) -> Ancestry {
    Ancestry {
        next: start.cloned(),
    }
}

/// find the commit with `id` among `start` and its ancestors
pub fn find_in_ancestry(start: Option<&CommitRef>, id: &str) -> Option<CommitRef> {
    ancestry(start).find(|c| c.id.as_str() == id)
}

/// message formatting for engine-generated commits
pub struct CommitMessage;

impl CommitMessage {
    /// placeholder a front end may substitute for an empty message
    pub const PLACEHOLDER: &'static str = "(no message)";

    /// format the message of a clean merge commit
    pub fn merge(branch: &str) -> String {
        format!("merge {}", branch)
    }
}
