//!   Repository state machine.
//!
//!  This is the central component of the storage layer. It owns the content
//!  store, the branch table, the staging area and HEAD, and exposes the
//!  add / commit / checkout / branch / merge operations.
//!
//!  `HEAD` is always the commit the current branch points at. Staged edits
//!  live only until the next commit or checkout; switching away without
//!  committing discards them.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::storage::blob::ContentStore;
use crate::storage::clock::{Clock, SystemClock, Timestamp};
use crate::storage::commit::{
    ancestry, find_in_ancestry, overlay, CommitBuilder, CommitMessage, CommitRef, FileMap,
};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::ids::{IdGenerator, IdScheme};
use crate::storage::merge::{find_merge_base, three_way_merge, MergeOutcome, MergePlan};
use crate::storage::refs::BranchTable;
use crate::storage::types::{BranchName, CommitId};

/// Repository configuration options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Branch created by `init`.
    pub default_branch: String,
    /// How commit ids are generated.
    pub id_scheme: IdScheme,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            default_branch: BranchName::DEFAULT.to_string(),
            id_scheme: IdScheme::default(),
        }
    }
}

impl RepositoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default branch name.
    pub fn default_branch(mut self, name: impl Into<String>) -> Self {
        self.default_branch = name.into();
        self
    }

    /// Set the id scheme.
    pub fn id_scheme(mut self, scheme: IdScheme) -> Self {
        self.id_scheme = scheme;
        self
    }
}

/// An in-memory repository.
///
/// Construction runs [`Repository::init`], so every instance is ready to use.
pub struct Repository {
    config: RepositoryConfig,
    store: ContentStore,
    branches: BranchTable,
    current_branch: String,
    head: Option<CommitRef>,
    staging: FileMap,
    clock: Box<dyn Clock + Send + Sync>,
    ids: Box<dyn IdGenerator + Send + Sync>,
}

impl Default for Repository {
    fn default() -> Self {
        Self::with_config(RepositoryConfig::default())
    }
}

impl Repository {
    /// Create a repository with the default configuration and the wall clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository with custom configuration and the wall clock.
    pub fn with_config(config: RepositoryConfig) -> Self {
        let ids = config.id_scheme.generator();
        Self::build(config, Box::new(SystemClock), ids)
    }

    /// Create a repository with explicit time and id sources.
    ///
    /// `config.id_scheme` is ignored in favour of `ids`.
    pub fn with_collaborators<C, G>(config: RepositoryConfig, clock: C, ids: G) -> Self
    where
        C: Clock + Send + Sync + 'static,
        G: IdGenerator + Send + Sync + 'static,
    {
        Self::build(config, Box::new(clock), Box::new(ids))
    }

    fn build(
        config: RepositoryConfig,
        clock: Box<dyn Clock + Send + Sync>,
        ids: Box<dyn IdGenerator + Send + Sync>,
    ) -> Self {
        let mut repo = Self {
            branches: BranchTable::new(),
            current_branch: config.default_branch.clone(),
            config,
            store: ContentStore::new(),
            head: None,
            staging: FileMap::new(),
            clock,
            ids,
        };
        repo.init();
        repo
    }

    /// Reset to a fresh state: no staged files, no HEAD, only the default branch.
    ///
    /// Commits made before remain alive only while something still holds them.
    /// The content store is kept.
    pub fn init(&mut self) {
        self.staging.clear();
        self.branches.reset_with_default(&self.config.default_branch);
        self.head = None;
        self.current_branch = self.config.default_branch.clone();
        info!(branch = %self.current_branch, "initialized repository");
    }

    // ==================== Accessors ====================

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Get the HEAD commit, if the current branch has one.
    pub fn head(&self) -> Option<&CommitRef> {
        self.head.as_ref()
    }

    /// Get the HEAD commit, failing on an empty branch.
    pub fn head_commit(&self) -> StorageResult<&CommitRef> {
        self.head.as_ref().ok_or(StorageError::EmptyRepository)
    }

    pub fn current_branch(&self) -> &str {
        &self.current_branch
    }

    /// All branches and their targets, sorted by name.
    pub fn branches(&self) -> Vec<(String, Option<CommitId>)> {
        self.branches
            .iter()
            .map(|(name, target)| (name.to_string(), target.map(|c| c.id().clone())))
            .collect()
    }

    /// The staging area.
    pub fn staged(&self) -> &FileMap {
        &self.staging
    }

    /// Read a file's content at HEAD.
    pub fn read_file(&self, name: &str) -> Option<&str> {
        self.head
            .as_ref()
            .and_then(|c| c.file(name))
            .map(|blob| blob.as_str())
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    // ==================== Staging and Commits ====================

    /// Stage `content` for `filename`, replacing any earlier staged version.
    ///
    /// Any file name is accepted, including the empty one.
    pub fn add(&mut self, filename: &str, content: &str) {
        let blob = self.store.intern(content);
        debug!(file = %filename, bytes = blob.len(), "staged");
        self.staging.insert(filename.to_string(), blob);
    }

    /// Snapshot HEAD's files with the staged entries laid over them.
    ///
    /// Always succeeds, even with nothing staged. Returns the new commit's id.
    pub fn commit(&mut self, message: &str) -> CommitId {
        let commit = CommitBuilder::new()
            .files(overlay(self.head.as_ref(), &self.staging))
            .parent(self.head.clone())
            .message(message)
            .build(&*self.clock, &mut *self.ids);

        info!(
            id = %commit.id(),
            branch = %self.current_branch,
            staged = self.staging.len(),
            "committed"
        );

        self.staging.clear();
        let id = commit.id().clone();
        self.advance_head(commit);
        id
    }

    /// History from HEAD back to the root, newest first.
    pub fn log(&self) -> Vec<CommitRef> {
        ancestry(self.head.as_ref()).collect()
    }

    /// One line per staged file, `staged: <name>`.
    pub fn status(&self) -> Vec<String> {
        self.staging
            .keys()
            .map(|name| format!("staged: {}", name))
            .collect()
    }

    fn advance_head(&mut self, commit: CommitRef) {
        self.branches
            .set(&self.current_branch, Some(Arc::clone(&commit)));
        self.head = Some(commit);
    }

    // ==================== Checkout ====================

    /// Find a commit by id.
    ///
    /// Searches HEAD's history first, then every branch's history in name order.
    pub fn find_commit(&self, id: &str) -> StorageResult<CommitRef> {
        find_in_ancestry(self.head.as_ref(), id)
            .or_else(|| {
                self.branches
                    .iter()
                    .find_map(|(_, target)| find_in_ancestry(target, id))
            })
            .ok_or_else(|| StorageError::CommitNotFound(id.to_string()))
    }

    /// Move HEAD to the commit `id`, discarding staged edits.
    ///
    /// The current branch moves along with HEAD: there is no detached state,
    /// checking out an old commit rewinds the branch itself.
    pub fn try_checkout(&mut self, id: &str) -> StorageResult<CommitRef> {
        let target = self.find_commit(id).inspect_err(|e| warn!("checkout failed: {}", e))?;

        self.staging.clear();
        self.advance_head(Arc::clone(&target));
        info!(id = %target.id(), branch = %self.current_branch, "checked out commit");
        Ok(target)
    }

    /// Like [`Repository::try_checkout`], reporting only whether it worked.
    pub fn checkout(&mut self, id: &str) -> bool {
        self.try_checkout(id).is_ok()
    }

    // ==================== Branches ====================

    /// Point branch `name` at HEAD, creating or overwriting it. Does not switch.
    pub fn branch(&mut self, name: &str) {
        self.branches.set(name, self.head.clone());
        debug!(branch = %name, head = ?self.head.as_ref().map(|c| c.id()), "branch set");
    }

    /// Get the commit a branch points at.
    pub fn resolve_branch(&self, name: &str) -> StorageResult<&CommitRef> {
        match self.branches.get(name) {
            Some(Some(commit)) => Ok(commit),
            Some(None) => Err(StorageError::UnbornBranch(name.to_string())),
            None => Err(StorageError::BranchNotFound(name.to_string())),
        }
    }

    /// Make `name` the current branch and move HEAD to its commit, discarding staged edits.
    ///
    /// Returns the new HEAD, which is none for a branch without commits.
    pub fn try_checkout_branch(&mut self, name: &str) -> StorageResult<Option<CommitRef>> {
        let target = match self.branches.get(name) {
            Some(target) => target.cloned(),
            None => {
                warn!(branch = %name, "no such branch");
                return Err(StorageError::BranchNotFound(name.to_string()));
            }
        };

        self.current_branch = name.to_string();
        self.head = target.clone();
        self.staging.clear();
        info!(branch = %name, "switched branch");
        Ok(target)
    }

    /// Like [`Repository::try_checkout_branch`], reporting only whether it worked.
    pub fn checkout_branch(&mut self, name: &str) -> bool {
        self.try_checkout_branch(name).is_ok()
    }

    // ==================== Merge ====================

    /// Merge branch `name` into the current branch.
    ///
    /// On a clean merge a commit `merge <name>` is created on top of HEAD.
    /// In every other case the repository is left exactly as it was.
    /// Staged edits are not touched.
    pub fn merge(&mut self, name: &str) -> MergeOutcome {
        let theirs = match self.branches.get(name) {
            None => {
                warn!(branch = %name, "merge target not found");
                return MergeOutcome::BranchNotFound(name.to_string());
            }
            Some(None) => {
                debug!(branch = %name, "merge target has no commits");
                return MergeOutcome::UpToDate;
            }
            Some(Some(commit)) => Arc::clone(commit),
        };

        let base = find_merge_base(self.head.as_ref(), &theirs);
        debug!(
            ours = ?self.head.as_ref().map(|c| c.id()),
            theirs = %theirs.id(),
            base = ?base.as_ref().map(|c| c.id()),
            "merge base"
        );

        let files = match three_way_merge(base.as_ref(), self.head.as_ref(), &theirs) {
            MergePlan::Clean(files) => files,
            MergePlan::Conflicted(conflicts) => {
                warn!(branch = %name, count = conflicts.len(), "merge stopped on conflicts");
                return MergeOutcome::Conflicts(conflicts);
            }
        };

        let commit = CommitBuilder::new()
            .files(files)
            .parent(self.head.clone())
            .message(CommitMessage::merge(name))
            .build(&*self.clock, &mut *self.ids);

        info!(id = %commit.id(), branch = %name, into = %self.current_branch, "merged");
        self.advance_head(Arc::clone(&commit));
        MergeOutcome::Merged(commit)
    }

    // ==================== Diagnostics ====================

    /// Capture HEAD, branches, staging and every reachable commit.
    pub fn show(&self) -> RepositoryDump {
        let mut seen = HashSet::new();
        let mut commits = Vec::new();

        let tips = std::iter::once(self.head.as_ref()).chain(self.branches.iter().map(|(_, t)| t));
        for tip in tips {
            for commit in ancestry(tip) {
                if !seen.insert(commit.id().clone()) {
                    // the rest of this history is already listed
                    break;
                }
                commits.push(CommitDump::from_commit(&commit));
            }
        }

        RepositoryDump {
            current_branch: self.current_branch.clone(),
            head: self.head.as_ref().map(|c| c.id().clone()),
            branches: self
                .branches
                .iter()
                .map(|(name, target)| (name.to_string(), target.map(|c| c.id().clone())))
                .collect(),
            staged: files_to_text(&self.staging),
            commits,
        }
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("config", &self.config)
            .field("current_branch", &self.current_branch)
            .field("head", &self.head.as_ref().map(|c| c.id()))
            .field("branches", &self.branches.names())
            .field("staged", &self.staging.keys().collect::<Vec<_>>())
            .field("blobs", &self.store.len())
            .finish()
    }
}

fn files_to_text(files: &FileMap) -> BTreeMap<String, String> {
    files
        .iter()
        .map(|(name, blob)| (name.clone(), blob.as_str().to_string()))
        .collect()
}

/// A snapshot of the repository's state for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryDump {
    pub current_branch: String,
    pub head: Option<CommitId>,
    pub branches: BTreeMap<String, Option<CommitId>>,
    pub staged: BTreeMap<String, String>,
    /// HEAD's history first, then whatever other branches add
    pub commits: Vec<CommitDump>,
}

/// One commit inside a [`RepositoryDump`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitDump {
    pub id: CommitId,
    pub message: String,
    pub timestamp: Timestamp,
    pub parent: Option<CommitId>,
    pub files: BTreeMap<String, String>,
}

impl CommitDump {
    fn from_commit(commit: &CommitRef) -> Self {
        Self {
            id: commit.id().clone(),
            message: commit.message().to_string(),
            timestamp: commit.timestamp(),
            parent: commit.parent().map(|p| p.id().clone()),
            files: files_to_text(commit.files()),
        }
    }
}

impl fmt::Display for RepositoryDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = self.head.as_ref().map(|id| id.to_string());
        writeln!(f, "HEAD: {} ({})", head.as_deref().unwrap_or("(none)"), self.current_branch)?;

        writeln!(f, "Branches:")?;
        for (name, target) in &self.branches {
            let marker = if *name == self.current_branch { "*" } else { " " };
            let target = target.as_ref().map(|id| id.to_string());
            writeln!(f, " {} {} -> {}", marker, name, target.as_deref().unwrap_or("(none)"))?;
        }

        writeln!(f, "Staged:")?;
        for (name, content) in &self.staged {
            writeln!(f, "  {} = {:?}", name, content)?;
        }

        writeln!(f, "Commits:")?;
        for commit in &self.commits {
            let parent = commit.parent.as_ref().map(|id| id.to_string());
            writeln!(
                f,
                "  {} {} parent={} {:?}",
                commit.id,
                commit.timestamp,
                parent.as_deref().unwrap_or("(root)"),
                commit.message
            )?;
            for (name, content) in &commit.files {
                writeln!(f, "      {} = {:?}", name, content)?;
            }
        }
        Ok(())
    }
}

/// A repository shared between threads.
///
/// Mutations take the write lock, so they are serialized; readers share the
/// read lock and may run together, but never alongside a mutation.
/// Clone this to share across threads - it uses Arc internally.
#[derive(Clone)]
pub struct SharedRepository {
    inner: Arc<RwLock<Repository>>,
}

impl SharedRepository {
    pub fn new(repo: Repository) -> Self {
        Self {
            inner: Arc::new(RwLock::new(repo)),
        }
    }

    /// Execute a function with read access to the repository.
    pub fn read<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&Repository) -> T,
    {
        let repo = self.inner.read();
        f(&repo)
    }

    /// Execute a function with write access to the repository.
    pub fn write<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut Repository) -> T,
    {
        let mut repo = self.inner.write();
        f(&mut repo)
    }
}

impl From<Repository> for SharedRepository {
    fn from(repo: Repository) -> Self {
        Self::new(repo)
    }
}
