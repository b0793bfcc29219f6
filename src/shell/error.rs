//! Shell error types.

use thiserror::Error;

use crate::storage::StorageError;

/// Result type for shell operations.
pub type ShellResult<T> = Result<T, ShellError>;

/// Errors raised while reading or running commands.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("usage: {command} <{argument}>")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ShellError {
    /// Check if the session can't continue after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShellError::Io(_))
    }
}
