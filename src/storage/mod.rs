//! storage layer for twig
//!
//! this module is the whole version-control engine: content store, commit
//! graph, branch table, staging area and merge. It keeps everything in
//! memory; nothing is persisted.
//!
//!  # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Repository                           │
//! │   (staging, HEAD, add / commit / checkout / branch / merge) │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │    blob     │       │    refs     │       │    merge    │
//!  │  (content)  │       │ (branches)  │       │  (3-way)    │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//!         │                     │                     │
//!         └─────────────────────┼─────────────────────┘
//!                               │
//!                               ▼
//!                        ┌─────────────┐
//!                        │   commit    │
//!                        │  (history)  │
//!                        └─────────────┘
//!  ```
//!
//! # Usage
//!
//! ```
//! use twig::storage::Repository;
//!
//! let mut repo = Repository::new();
//! repo.add("x.txt", "v1");
//! repo.commit("base");
//!
//! repo.branch("dev");
//! repo.checkout_branch("dev");
//! repo.add("y.txt", "dev-only");
//! repo.commit("dev change");
//!
//! repo.checkout_branch("master");
//! let outcome = repo.merge("dev");
//! assert!(outcome.is_merged());
//! assert_eq!(repo.read_file("y.txt"), Some("dev-only"));
//! ```

mod blob;
mod clock;
mod commit;
mod error;
mod ids;
mod merge;
mod refs;
mod repository;
mod types;

// Re-export public API
pub use blob::{same_blob, same_version, Blob, BlobRef, ContentStore};
pub use clock::{Clock, FixedClock, SystemClock, Timestamp};
pub use commit::{ancestry, Ancestry, Commit, CommitBuilder, CommitMessage, CommitRef, FileMap};
pub use error::{StorageError, StorageResult};
pub use ids::{CounterIdGenerator, IdGenerator, IdScheme, UlidIdGenerator};
pub use merge::{find_merge_base, three_way_merge, FileResolution, MergeOutcome, MergePlan};
pub use refs::BranchTable;
pub use repository::{CommitDump, Repository, RepositoryConfig, RepositoryDump, SharedRepository};
pub use types::{BranchName, CommitId};
