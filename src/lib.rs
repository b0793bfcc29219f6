//! twig - a minimal in-memory version-control engine
//!
//! This crate tracks named file contents across a graph of immutable
//! commits, supports multiple branches, and merges diverged branches with a
//! three-way comparison against their common ancestor. Everything lives in
//! memory for the life of the process.
//!
//! # Example
//!
//! ```
//! use twig::storage::Repository;
//!
//! let mut repo = Repository::new();
//! repo.add("notes.txt", "hello");
//! let id = repo.commit("first");
//! assert_eq!(repo.log()[0].id(), &id);
//! ```

pub mod shell;
pub mod storage;
