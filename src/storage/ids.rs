//! Commit id generation.
//!
//! Ids only need to be unique within a session. Each repository owns its
//! generator; there is no process-wide counter.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::storage::types::CommitId;

/// Produces commit identifiers.
pub trait IdGenerator {
    /// generate a fresh id; `seed` is the commit's message and timestamp and may be ignored
    fn generate(&mut self, seed: &str) -> CommitId;
}

/// Sequential lowercase hex ids: `1`, `2`, ..., `a`, `b`, ...
#[derive(Debug, Clone)]
pub struct CounterIdGenerator {
    next: u64,
}

impl CounterIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }
}

impl Default for CounterIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for CounterIdGenerator {
    fn generate(&mut self, _seed: &str) -> CommitId {
        let id = CommitId::new(format!("{:x}", self.next));
        self.next += 1;
        id
    }
}

/// ULID-based ids, unique across sessions as well.
#[derive(Debug, Clone, Copy, Default)]
pub struct UlidIdGenerator;

impl IdGenerator for UlidIdGenerator {
    fn generate(&mut self, _seed: &str) -> CommitId {
        CommitId::new(Ulid::new().to_string().to_lowercase())
    }
}

/// Which generator a repository is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IdScheme {
    #[default]
    Counter,
    Ulid,
}

impl IdScheme {
    /// build the generator for this scheme
    pub fn generator(self) -> Box<dyn IdGenerator + Send + Sync> {
        match self {
            IdScheme::Counter => Box::new(CounterIdGenerator::new()),
            IdScheme::Ulid => Box::new(UlidIdGenerator),
        }
    }
}
