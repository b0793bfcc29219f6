//!  Branch table management.
//!
//!  A branch is a name pointing at a commit, or at nothing for a branch
//!  with no commits yet. This module handles:
//! - creating and force-updating branches
//! - resolving names to commits
//! - listing branches in a stable order

use std::collections::btree_map::{self, BTreeMap};

use crate::storage::commit::CommitRef;

/// Maps branch names to the commit each one points at.
#[derive(Debug, Clone, Default)]
pub struct BranchTable {
    branches: BTreeMap<String, Option<CommitRef>>,
}

impl BranchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// create a table holding only `default_branch`, pointing at nothing
    pub fn with_default(default_branch: &str) -> Self {
        let mut table = Self::new();
        table.set(default_branch, None);
        table
    }

    /// drop every branch and re-create `default_branch`, unborn
    pub fn reset_with_default(&mut self, default_branch: &str) {
        self.branches.clear();
        self.set(default_branch, None);
    }

    /// Point `name` at `target`, creating the branch if needed.
    ///
    /// This is a force update: an existing branch is overwritten.
    pub fn set(&mut self, name: &str, target: Option<CommitRef>) {
        self.branches.insert(name.to_string(), target);
    }

    /// Resolve a branch.
    ///
    /// `None` means the branch doesn't exist; `Some(None)` means it exists
    /// but has no commits.
    pub fn get(&self, name: &str) -> Option<Option<&CommitRef>> {
        self.branches.get(name).map(Option::as_ref)
    }

    /// branch names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.branches.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.branches.iter(),
        }
    }
}

/// iterator over `(name, target)` pairs in name order
pub struct Iter<'a> {
    inner: btree_map::Iter<'a, String, Option<CommitRef>>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, Option<&'a CommitRef>);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(name, target)| (name.as_str(), target.as_ref()))
    }
}

impl<'a> IntoIterator for &'a BranchTable {
    type Item = (&'a str, Option<&'a CommitRef>);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
