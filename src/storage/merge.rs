//! Three-way merge of two branch tips.
//!
//! Every commit has at most one parent, so the history is a forest and the
//! merge base is simply the first commit on the other tip's ancestry that
//! also lies on ours.
//!
//! Files are reconciled one at a time against the base, comparing blob
//! identity (the content store guarantees equal text means the same blob):
//!
//! | ours vs base | theirs vs base | ours vs theirs | result          |
//! |--------------|----------------|----------------|-----------------|
//! | same         | any            | any            | take theirs     |
//! | changed      | same           | any            | keep ours       |
//! | changed      | changed        | same           | keep ours       |
//! | changed      | changed        | different      | conflict        |
//!
//! Files only we have are never touched; nothing is ever deleted.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::storage::blob::{same_version, BlobRef};
use crate::storage::commit::{ancestry, CommitRef, FileMap};
use crate::storage::types::CommitId;

/// find the merge base (common ancestor) of two tips
///
/// returns None if the tips share no history
pub fn find_merge_base(ours: Option<&CommitRef>, theirs: &CommitRef) -> Option<CommitRef> {
    let seen: HashSet<CommitId> = ancestry(ours).map(|c| c.id().clone()).collect();
    ancestry(Some(theirs)).find(|c| seen.contains(c.id()))
}

/// How a single file is reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileResolution {
    /// our version stays (also covers "both sides agree")
    KeepOurs,
    /// only their side moved away from the base
    TakeTheirs,
    /// both sides changed it, differently
    Conflict,
}

/// decide one file given its version at the base, on our side and on theirs
pub fn resolve_file(
    base: Option<&BlobRef>,
    ours: Option<&BlobRef>,
    theirs: Option<&BlobRef>,
) -> FileResolution {
    let ours_unchanged = same_version(base, ours);
    let theirs_unchanged = same_version(base, theirs);

    if !ours_unchanged && !theirs_unchanged && !same_version(ours, theirs) {
        FileResolution::Conflict
    } else if ours_unchanged && theirs.is_some() {
        FileResolution::TakeTheirs
    } else {
        FileResolution::KeepOurs
    }
}

/// Result of reconciling two file sets.
#[derive(Debug, Clone)]
pub enum MergePlan {
    /// the merged file set
    Clean(FileMap),
    /// files changed differently on both sides
    Conflicted(BTreeSet<String>),
}

/// reconcile their files into ours relative to `base`
pub fn three_way_merge(
    base: Option<&CommitRef>,
    ours: Option<&CommitRef>,
    theirs: &CommitRef,
) -> MergePlan {
    let mut merged = ours.map(|c| c.files().clone()).unwrap_or_default();
    let mut conflicts = BTreeSet::new();

    for (name, their_blob) in theirs.files() {
        let base_blob = base.and_then(|b| b.file(name));
        let our_blob = merged.get(name);

        match resolve_file(base_blob, our_blob, Some(their_blob)) {
            FileResolution::Conflict => {
                debug!(file = %name, "conflict");
                conflicts.insert(name.clone());
            }
            FileResolution::TakeTheirs => {
                debug!(file = %name, "taking their version");
                merged.insert(name.clone(), Arc::clone(their_blob));
            }
            FileResolution::KeepOurs => {}
        }
    }

    if conflicts.is_empty() {
        MergePlan::Clean(merged)
    } else {
        MergePlan::Conflicted(conflicts)
    }
}

/// Outcome of merging a branch into the current one.
#[derive(Debug, Clone)]
pub enum MergeOutcome {
    /// no branch with that name; nothing changed
    BranchNotFound(String),
    /// the branch exists but has no commits; nothing changed
    UpToDate,
    /// a merge commit was created and is the new HEAD
    Merged(CommitRef),
    /// files changed differently on both sides; nothing changed
    Conflicts(BTreeSet<String>),
}

impl MergeOutcome {
    /// The conflicting files, empty unless the merge conflicted.
    ///
    /// This is the flat view where "not found", "nothing to do" and "merged"
    /// all read as an empty list.
    pub fn conflicts(&self) -> Vec<String> {
        match self {
            MergeOutcome::Conflicts(files) => files.iter().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// check if the merge produced a commit
    pub fn is_merged(&self) -> bool {
        matches!(self, MergeOutcome::Merged(_))
    }

    /// check if the merge stopped on conflicts
    pub fn is_conflict(&self) -> bool {
        matches!(self, MergeOutcome::Conflicts(_))
    }

    /// the merge commit, if one was made
    pub fn commit(&self) -> Option<&CommitRef> {
        match self {
            MergeOutcome::Merged(commit) => Some(commit),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::blob::{same_blob, ContentStore};
    use crate::storage::clock::FixedClock;
    use crate::storage::commit::{overlay, CommitBuilder};
    use crate::storage::ids::CounterIdGenerator;

    struct Graph {
        store: ContentStore,
        clock: FixedClock,
        ids: CounterIdGenerator,
    }

    impl Graph {
        fn new() -> Self {
            Self {
                store: ContentStore::new(),
                clock: FixedClock::default(),
                ids: CounterIdGenerator::new(),
            }
        }

        fn commit(&mut self, parent: Option<&CommitRef>, staged: &[(&str, &str)]) -> CommitRef {
            let mut staging = FileMap::new();
            for (name, content) in staged {
                staging.insert(name.to_string(), self.store.intern(content));
            }
            CommitBuilder::new()
                .files(overlay(parent, &staging))
                .parent(parent.cloned())
                .build(&self.clock, &mut self.ids)
        }
    }

    #[test]
    fn test_merge_base_of_diverged_tips() {
        let mut g = Graph::new();
        let base = g.commit(None, &[]);
        let a = g.commit(Some(&base), &[]);
        let b1 = g.commit(Some(&base), &[]);
        let b2 = g.commit(Some(&b1), &[]);

        let found = find_merge_base(Some(&a), &b2).unwrap();
        assert!(Arc::ptr_eq(&found, &base));
    }

    #[test]
    fn test_merge_base_of_descendant_is_ours() {
        let mut g = Graph::new();
        let c1 = g.commit(None, &[]);
        let c2 = g.commit(Some(&c1), &[]);
        let c3 = g.commit(Some(&c2), &[]);

        let found = find_merge_base(Some(&c2), &c3).unwrap();
        assert!(Arc::ptr_eq(&found, &c2));
    }

    #[test]
    fn test_merge_base_disjoint_histories() {
        let mut g = Graph::new();
        let a = g.commit(None, &[]);
        let b = g.commit(None, &[]);

        assert!(find_merge_base(Some(&a), &b).is_none());
        assert!(find_merge_base(None, &b).is_none());
    }

    #[test]
    fn test_resolve_file_table() {
        let mut store = ContentStore::new();
        let base = store.intern("base");
        let x = store.intern("x");
        let y = store.intern("y");

        // only theirs changed
        assert_eq!(resolve_file(Some(&base), Some(&base), Some(&x)), FileResolution::TakeTheirs);
        // only ours changed
        assert_eq!(resolve_file(Some(&base), Some(&x), Some(&base)), FileResolution::KeepOurs);
        // both changed the same way
        assert_eq!(resolve_file(Some(&base), Some(&x), Some(&x)), FileResolution::KeepOurs);
        // both changed differently
        assert_eq!(resolve_file(Some(&base), Some(&x), Some(&y)), FileResolution::Conflict);
        // new on their side only
        assert_eq!(resolve_file(None, None, Some(&x)), FileResolution::TakeTheirs);
        // added on both sides with different content
        assert_eq!(resolve_file(None, Some(&x), Some(&y)), FileResolution::Conflict);
        // nothing changed anywhere
        assert_eq!(resolve_file(Some(&base), Some(&base), Some(&base)), FileResolution::TakeTheirs);
    }

    #[test]
    fn test_clean_merge_takes_their_changes() {
        let mut g = Graph::new();
        let base = g.commit(None, &[("shared.txt", "v1"), ("theirs.txt", "v1")]);
        let ours = g.commit(Some(&base), &[("ours.txt", "mine")]);
        let theirs = g.commit(Some(&base), &[("theirs.txt", "v2"), ("new.txt", "fresh")]);

        let merge_base = find_merge_base(Some(&ours), &theirs);
        let files = match three_way_merge(merge_base.as_ref(), Some(&ours), &theirs) {
            MergePlan::Clean(files) => files,
            MergePlan::Conflicted(c) => panic!("unexpected conflicts: {:?}", c),
        };

        assert_eq!(files.len(), 4);
        assert_eq!(files["shared.txt"].as_str(), "v1");
        assert_eq!(files["theirs.txt"].as_str(), "v2");
        assert_eq!(files["new.txt"].as_str(), "fresh");
        assert_eq!(files["ours.txt"].as_str(), "mine");
    }

    #[test]
    fn test_divergent_edit_conflicts() {
        let mut g = Graph::new();
        let base = g.commit(None, &[("x.txt", "A"), ("y.txt", "A")]);
        let ours = g.commit(Some(&base), &[("x.txt", "C"), ("y.txt", "same")]);
        let theirs = g.commit(Some(&base), &[("x.txt", "B"), ("y.txt", "same")]);

        match three_way_merge(Some(&base), Some(&ours), &theirs) {
            MergePlan::Conflicted(files) => {
                assert_eq!(files.into_iter().collect::<Vec<_>>(), vec!["x.txt"]);
            }
            MergePlan::Clean(_) => panic!("expected a conflict"),
        }
    }

    #[test]
    fn test_identical_text_from_separate_adds_is_not_a_conflict() {
        let mut g = Graph::new();
        let base = g.commit(None, &[("f", "old")]);
        // two independent interns of the same text
        let ours = g.commit(Some(&base), &[("f", "same text")]);
        let theirs = g.commit(Some(&base), &[("f", "same text")]);
        assert!(same_blob(ours.file("f").unwrap(), theirs.file("f").unwrap()));

        assert!(matches!(
            three_way_merge(Some(&base), Some(&ours), &theirs),
            MergePlan::Clean(_)
        ));
    }

    #[test]
    fn test_merge_without_ours() {
        let mut g = Graph::new();
        let theirs = g.commit(None, &[("a", "1")]);

        match three_way_merge(None, None, &theirs) {
            MergePlan::Clean(files) => assert_eq!(files["a"].as_str(), "1"),
            MergePlan::Conflicted(_) => panic!("nothing to conflict with"),
        }
    }

    #[test]
    fn test_outcome_conflicts_view() {
        assert!(MergeOutcome::BranchNotFound("x".into()).conflicts().is_empty());
        assert!(MergeOutcome::UpToDate.conflicts().is_empty());

        let conflicted = MergeOutcome::Conflicts(["b", "a"].iter().map(|s| s.to_string()).collect());
        assert_eq!(conflicted.conflicts(), vec!["a", "b"]);
        assert!(conflicted.is_conflict());
        assert!(!conflicted.is_merged());
        assert!(conflicted.commit().is_none());
    }
}
