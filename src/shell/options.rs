//! Command-line options for the `twig` binary.

use crate::storage::{IdScheme, RepositoryConfig};

use super::error::{ShellError, ShellResult};
use super::repl::ReplConfig;

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// interactive session
    Repl,
    /// run a `;`-separated script and exit
    Execute(String),
    Help,
    Version,
}

/// Parsed command-line options.
#[derive(Debug, Clone)]
pub struct CliOptions {
    pub action: Action,
    pub verbose: bool,
    pub repository: RepositoryConfig,
    pub repl: ReplConfig,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            action: Action::Repl,
            verbose: false,
            repository: RepositoryConfig::default(),
            repl: ReplConfig::default(),
        }
    }
}

impl CliOptions {
    /// Parse arguments, excluding the program name.
    pub fn parse<I, S>(args: I) -> ShellResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = Self::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-v" | "--verbose" => {
                    options.verbose = true;
                }
                "--ulid" => {
                    options.repository.id_scheme = IdScheme::Ulid;
                }
                "--json" => {
                    options.repl.json = true;
                }
                "-b" | "--branch" => {
                    let name = args
                        .next()
                        .ok_or_else(|| ShellError::InvalidOption(format!("{} needs a branch name", arg)))?;
                    options.repository.default_branch = name;
                }
                "-e" | "--execute" => {
                    let script = args
                        .next()
                        .ok_or_else(|| ShellError::InvalidOption(format!("{} needs a script", arg)))?;
                    options.action = Action::Execute(script);
                }
                "-h" | "--help" => {
                    options.action = Action::Help;
                }
                "--version" => {
                    options.action = Action::Version;
                }
                other => {
                    return Err(ShellError::InvalidOption(other.to_string()));
                }
            }
        }

        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CliOptions::parse(Vec::<String>::new()).unwrap();
        assert_eq!(options.action, Action::Repl);
        assert!(!options.verbose);
        assert_eq!(options.repository, RepositoryConfig::default());
    }

    #[test]
    fn test_flags() {
        let options = CliOptions::parse(["-v", "--ulid", "-b", "main", "--json"]).unwrap();
        assert!(options.verbose);
        assert_eq!(options.repository.id_scheme, IdScheme::Ulid);
        assert_eq!(options.repository.default_branch, "main");
        assert!(options.repl.json);
    }

    #[test]
    fn test_execute() {
        let options = CliOptions::parse(["-e", "add a; hi; commit one"]).unwrap();
        assert_eq!(options.action, Action::Execute("add a; hi; commit one".into()));
    }

    #[test]
    fn test_missing_value() {
        assert!(matches!(
            CliOptions::parse(["--branch"]),
            Err(ShellError::InvalidOption(_))
        ));
    }

    #[test]
    fn test_unknown_option() {
        assert!(matches!(
            CliOptions::parse(["--frob"]),
            Err(ShellError::InvalidOption(o)) if o == "--frob"
        ));
    }
}
