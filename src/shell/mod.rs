//! Command-line front end.
//!
//! A thin line-oriented shell over [`Repository`](crate::storage::Repository):
//! one command per line, replies on the output stream.

mod command;
mod error;
mod options;
mod repl;

pub use command::Command;
pub use error::{ShellError, ShellResult};
pub use options::{Action, CliOptions};
pub use repl::{Repl, ReplConfig};
