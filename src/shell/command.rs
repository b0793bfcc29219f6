//! Parsing of shell command lines.

use super::error::{ShellError, ShellResult};

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Exit,
    Init,
    /// content follows on the next input line
    Add { file: String },
    /// empty when no message was given
    Commit { message: String },
    Log,
    Checkout { id: String },
    Branch { name: String },
    CheckoutBranch { name: String },
    Merge { branch: String },
    Status,
    Show { json: bool },
    Branches,
    Cat { file: String },
    History,
}

impl Command {
    /// Parse one input line.
    ///
    /// Arguments are single whitespace-separated words, except the commit
    /// message, which is the rest of the line with one leading space removed.
    pub fn parse(line: &str) -> ShellResult<Self> {
        let line = line.trim_start();
        let (name, rest) = match line.find(char::is_whitespace) {
            Some(at) => line.split_at(at),
            None => (line, ""),
        };
        let mut args = rest.split_whitespace();

        let command = match name {
            "help" | "h" | "?" => Command::Help,
            "exit" | "quit" | "q" => Command::Exit,
            "init" => Command::Init,
            "add" => Command::Add {
                file: required(args.next(), "add", "file")?,
            },
            "commit" => Command::Commit {
                message: rest.strip_prefix(' ').unwrap_or(rest).to_string(),
            },
            "log" => Command::Log,
            "checkout" => Command::Checkout {
                id: required(args.next(), "checkout", "commit-id")?,
            },
            "branch" => Command::Branch {
                name: required(args.next(), "branch", "name")?,
            },
            "checkout-branch" => Command::CheckoutBranch {
                name: required(args.next(), "checkout-branch", "name")?,
            },
            "merge" => Command::Merge {
                branch: required(args.next(), "merge", "branch")?,
            },
            "status" => Command::Status,
            "show" => Command::Show {
                json: args.any(|a| a == "--json"),
            },
            "branches" => Command::Branches,
            "cat" => Command::Cat {
                file: required(args.next(), "cat", "file")?,
            },
            "history" => Command::History,
            other => return Err(ShellError::UnknownCommand(other.to_string())),
        };

        Ok(command)
    }
}

fn required(arg: Option<&str>, command: &'static str, argument: &'static str) -> ShellResult<String> {
    arg.map(str::to_string)
        .ok_or(ShellError::MissingArgument { command, argument })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("init").unwrap(), Command::Init);
        assert_eq!(Command::parse("  log  ").unwrap(), Command::Log);
        assert_eq!(Command::parse("quit").unwrap(), Command::Exit);
        assert_eq!(Command::parse("show").unwrap(), Command::Show { json: false });
        assert_eq!(Command::parse("show --json").unwrap(), Command::Show { json: true });
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(
            Command::parse("add x.txt").unwrap(),
            Command::Add { file: "x.txt".into() }
        );
        assert_eq!(
            Command::parse("checkout-branch dev extra").unwrap(),
            Command::CheckoutBranch { name: "dev".into() }
        );
        assert_eq!(
            Command::parse("merge\tdev").unwrap(),
            Command::Merge { branch: "dev".into() }
        );
    }

    #[test]
    fn test_commit_message_keeps_inner_spacing() {
        assert_eq!(
            Command::parse("commit fix  the   bug").unwrap(),
            Command::Commit { message: "fix  the   bug".into() }
        );
        assert_eq!(
            Command::parse("commit").unwrap(),
            Command::Commit { message: String::new() }
        );
        assert_eq!(
            Command::parse("commit  two spaces").unwrap(),
            Command::Commit { message: " two spaces".into() }
        );
    }

    #[test]
    fn test_missing_argument() {
        let err = Command::parse("checkout").unwrap_err();
        assert!(matches!(
            err,
            ShellError::MissingArgument { command: "checkout", argument: "commit-id" }
        ));
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(
            Command::parse("frobnicate now"),
            Err(ShellError::UnknownCommand(name)) if name == "frobnicate"
        ));
    }
}
