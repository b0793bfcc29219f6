//! Interactive REPL (Read-Eval-Print Loop) for twig.

use std::io::{self, BufRead, Cursor, Write};

use tracing::debug;

use super::command::Command;
use super::error::{ShellError, ShellResult};
use crate::storage::{CommitMessage, MergeOutcome, Repository};

/// REPL configuration.
#[derive(Debug, Clone)]
pub struct ReplConfig {
    /// Prompt string.
    pub prompt: String,
    /// Print the banner on start.
    pub banner: bool,
    /// Print prompts (the command prompt and the content prompt of `add`).
    pub prompts: bool,
    /// Show dumps as JSON.
    pub json: bool,
    /// Message used for `commit` without one.
    pub commit_placeholder: String,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: "> ".into(),
            banner: true,
            prompts: true,
            json: false,
            commit_placeholder: CommitMessage::PLACEHOLDER.into(),
        }
    }
}

impl ReplConfig {
    /// settings for running a script: no banner, no prompts
    pub fn quiet(mut self) -> Self {
        self.banner = false;
        self.prompts = false;
        self
    }
}

/// The interactive REPL.
pub struct Repl {
    repo: Repository,
    config: ReplConfig,
    history: Vec<String>,
}

impl Repl {
    /// Create a new REPL over the given repository.
    pub fn new(repo: Repository) -> Self {
        Self::with_config(repo, ReplConfig::default())
    }

    /// Create a REPL with custom configuration.
    pub fn with_config(repo: Repository, config: ReplConfig) -> Self {
        Self {
            repo,
            config,
            history: Vec::new(),
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn into_repository(self) -> Repository {
        self.repo
    }

    /// Run the REPL on stdin/stdout.
    pub fn run(&mut self) -> ShellResult<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run_with(stdin.lock(), stdout.lock())
    }

    /// Run `;`-separated commands; the content of an `add` is the next item.
    pub fn run_script<W: Write>(&mut self, script: &str, output: W) -> ShellResult<()> {
        let lines: Vec<&str> = script.split(';').map(str::trim).collect();
        self.run_with(Cursor::new(lines.join("\n")), output)
    }

    /// Run the REPL until `exit` or end of input.
    pub fn run_with<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> ShellResult<()> {
        if self.config.banner {
            self.print_banner(&mut output)?;
        }

        loop {
            if self.config.prompts {
                write!(output, "{}", self.config.prompt)?;
                output.flush()?;
            }

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                // EOF.
                break;
            }

            let line = line.trim_end();
            if line.trim().is_empty() {
                continue;
            }
            self.history.push(line.to_string());

            match self.execute(line, &mut input, &mut output) {
                Ok(true) => break,
                Ok(false) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => writeln!(output, "Error: {}", e)?,
            }
        }

        output.flush()?;
        Ok(())
    }

    /// Execute one command line. Returns true when the session should end.
    pub fn execute<R: BufRead, W: Write>(
        &mut self,
        line: &str,
        input: &mut R,
        output: &mut W,
    ) -> ShellResult<bool> {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(ShellError::UnknownCommand(name)) => {
                debug!(command = %name, "unknown command");
                writeln!(output, "unknown")?;
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        debug!(?command, "dispatch");
        self.dispatch(command, input, output)
    }

    fn dispatch<R: BufRead, W: Write>(
        &mut self,
        command: Command,
        input: &mut R,
        output: &mut W,
    ) -> ShellResult<bool> {
        match command {
            Command::Help => self.print_help(output)?,
            Command::Exit => return Ok(true),
            Command::Init => {
                self.repo.init();
                writeln!(output, "initialized")?;
            }
            Command::Add { file } => {
                if self.config.prompts {
                    write!(output, "Enter content (single line): ")?;
                    output.flush()?;
                }
                let content = read_content(input)?;
                self.repo.add(&file, &content);
                writeln!(output, "added")?;
            }
            Command::Commit { message } => {
                let message = if message.is_empty() {
                    self.config.commit_placeholder.clone()
                } else {
                    message
                };
                let id = self.repo.commit(&message);
                writeln!(output, "Committed {}", id)?;
            }
            Command::Log => {
                for commit in self.repo.log() {
                    writeln!(output, "{} {} {}", commit.id(), commit.timestamp(), commit.message())?;
                }
            }
            Command::Checkout { id } => {
                let reply = if self.repo.checkout(&id) { "checked out" } else { "not found" };
                writeln!(output, "{}", reply)?;
            }
            Command::Branch { name } => {
                self.repo.branch(&name);
                writeln!(output, "branch created")?;
            }
            Command::CheckoutBranch { name } => {
                let reply = if self.repo.checkout_branch(&name) { "switched" } else { "not found" };
                writeln!(output, "{}", reply)?;
            }
            Command::Merge { branch } => match self.repo.merge(&branch) {
                MergeOutcome::Merged(_) => writeln!(output, "merge ok")?,
                MergeOutcome::UpToDate => writeln!(output, "already up to date")?,
                MergeOutcome::BranchNotFound(_) => writeln!(output, "branch not found")?,
                MergeOutcome::Conflicts(files) => {
                    let files: Vec<&str> = files.iter().map(String::as_str).collect();
                    writeln!(output, "conflicts: {}", files.join(", "))?;
                }
            },
            Command::Status => {
                for line in self.repo.status() {
                    writeln!(output, "{}", line)?;
                }
            }
            Command::Show { json } => {
                let dump = self.repo.show();
                if json || self.config.json {
                    writeln!(output, "{}", serde_json::to_string_pretty(&dump)?)?;
                } else {
                    write!(output, "{}", dump)?;
                }
            }
            Command::Branches => {
                let current = self.repo.current_branch().to_string();
                for (name, target) in self.repo.branches() {
                    let marker = if name == current { "*" } else { " " };
                    let target = target.map(|id| id.short().to_string());
                    writeln!(output, "{} {} {}", marker, name, target.as_deref().unwrap_or("(no commits)"))?;
                }
            }
            Command::Cat { file } => {
                let head = self.repo.head_commit()?;
                match head.file(&file) {
                    Some(blob) => writeln!(output, "{}", blob)?,
                    None => writeln!(output, "not found")?,
                }
            }
            Command::History => {
                for (i, cmd) in self.history.iter().enumerate() {
                    writeln!(output, "  {}: {}", i + 1, cmd)?;
                }
            }
        }

        Ok(false)
    }

    fn print_banner<W: Write>(&self, output: &mut W) -> io::Result<()> {
        writeln!(output, "twig v{} (type help)", env!("CARGO_PKG_VERSION"))
    }

    fn print_help<W: Write>(&self, output: &mut W) -> io::Result<()> {
        writeln!(output, "Commands:")?;
        writeln!(output, "  init                     Reset to an empty repository")?;
        writeln!(output, "  add <file>               Stage a file; content is read from the next line")?;
        writeln!(output, "  commit [message]         Commit staged files")?;
        writeln!(output, "  log                      Show history from HEAD")?;
        writeln!(output, "  checkout <commit-id>     Move HEAD (and the current branch) to a commit")?;
        writeln!(output, "  branch <name>            Point a branch at HEAD")?;
        writeln!(output, "  checkout-branch <name>   Switch to a branch")?;
        writeln!(output, "  merge <branch>           Merge a branch into the current one")?;
        writeln!(output, "  status                   List staged files")?;
        writeln!(output, "  show [--json]            Dump the repository state")?;
        writeln!(output, "  branches                 List branches")?;
        writeln!(output, "  cat <file>               Print a file at HEAD")?;
        writeln!(output, "  history                  Show command history")?;
        writeln!(output, "  help, exit")?;
        Ok(())
    }
}

/// read the content line of an `add`, dropping the line ending and one leading space
fn read_content<R: BufRead>(input: &mut R) -> io::Result<String> {
    let mut content = String::new();
    input.read_line(&mut content)?;

    let content = content.trim_end_matches(['\n', '\r']);
    Ok(content.strip_prefix(' ').unwrap_or(content).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CounterIdGenerator, FixedClock, RepositoryConfig};

    fn repl() -> Repl {
        let repo = Repository::with_collaborators(
            RepositoryConfig::default(),
            FixedClock::default(),
            CounterIdGenerator::new(),
        );
        Repl::with_config(repo, ReplConfig::default().quiet())
    }

    fn session(repl: &mut Repl, input: &str) -> Vec<String> {
        let mut output = Vec::new();
        repl.run_with(Cursor::new(input.to_string()), &mut output).unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_add_and_commit() {
        let mut repl = repl();
        let out = session(&mut repl, "add x.txt\n hello world\nstatus\ncommit first\n");

        assert_eq!(out, vec!["added", "staged: x.txt", "Committed 1"]);
        assert_eq!(repl.repository().read_file("x.txt"), Some("hello world"));
    }

    #[test]
    fn test_commit_placeholder() {
        let mut repl = repl();
        session(&mut repl, "commit\n");
        assert_eq!(repl.repository().head().unwrap().message(), "(no message)");
    }

    #[test]
    fn test_merge_replies() {
        let mut repl = repl();
        let out = session(
            &mut repl,
            "add x.txt\nA\ncommit a\nbranch dev\ncheckout-branch dev\nadd x.txt\nB\ncommit b\n\
             checkout-branch master\nadd x.txt\nC\ncommit c\nmerge dev\nmerge nope\n",
        );

        assert_eq!(out[out.len() - 2], "conflicts: x.txt");
        assert_eq!(out[out.len() - 1], "branch not found");
    }

    #[test]
    fn test_clean_merge_reply() {
        let mut repl = repl();
        let out = session(
            &mut repl,
            "add x.txt\nv1\ncommit base\nbranch dev\ncheckout-branch dev\nadd y.txt\ndev-only\n\
             commit dev change\ncheckout-branch master\nmerge dev\ncat y.txt\n",
        );

        assert_eq!(out[out.len() - 2], "merge ok");
        assert_eq!(out[out.len() - 1], "dev-only");
    }

    #[test]
    fn test_checkout_replies() {
        let mut repl = repl();
        let out = session(&mut repl, "commit one\ncheckout 1\ncheckout 99\ncheckout-branch nope\n");
        assert_eq!(out, vec!["Committed 1", "checked out", "not found", "not found"]);
    }

    #[test]
    fn test_log_lines() {
        let mut repl = repl();
        let out = session(&mut repl, "commit one\ncommit two\nlog\n");

        assert_eq!(out.len(), 4);
        assert!(out[2].starts_with("2 "));
        assert!(out[2].ends_with(" two"));
        assert!(out[3].starts_with("1 "));
    }

    #[test]
    fn test_unknown_and_usage() {
        let mut repl = repl();
        let out = session(&mut repl, "frobnicate\nbranch\n");
        assert_eq!(out, vec!["unknown", "Error: usage: branch <name>"]);
    }

    #[test]
    fn test_cat_on_empty_repository() {
        let mut repl = repl();
        let out = session(&mut repl, "cat x\n");
        assert_eq!(out, vec!["Error: storage error: repository is empty: no commits found"]);
    }

    #[test]
    fn test_exit_stops_reading() {
        let mut repl = repl();
        let out = session(&mut repl, "exit\ncommit never\n");
        assert!(out.is_empty());
        assert!(repl.repository().head().is_none());
    }

    #[test]
    fn test_branches_listing() {
        let mut repl = repl();
        let out = session(&mut repl, "commit one\nbranch dev\nbranch empty\nbranches\n");
        assert_eq!(&out[3..], &["  dev 1", "  empty 1", "* master 1"]);
    }

    #[test]
    fn test_show_json() {
        let mut repl = repl();
        let mut output = Vec::new();
        repl.run_with(Cursor::new("add a\n1\ncommit one\nshow --json\n"), &mut output)
            .unwrap();

        let text = String::from_utf8(output).unwrap();
        let json_start = text.find('{').unwrap();
        let dump: serde_json::Value = serde_json::from_str(&text[json_start..]).unwrap();
        assert_eq!(dump["current_branch"], "master");
        assert_eq!(dump["commits"][0]["message"], "one");
    }

    #[test]
    fn test_run_script() {
        let mut repl = repl();
        let mut output = Vec::new();
        repl.run_script("add a.txt; first line; commit one; status", &mut output)
            .unwrap();

        assert_eq!(repl.repository().read_file("a.txt"), Some("first line"));
        assert_eq!(String::from_utf8(output).unwrap(), "added\nCommitted 1\n");
    }

    #[test]
    fn test_prompts_when_interactive() {
        let repo = Repository::with_collaborators(
            RepositoryConfig::default(),
            FixedClock::default(),
            CounterIdGenerator::new(),
        );
        let mut repl = Repl::with_config(repo, ReplConfig { banner: false, ..ReplConfig::default() });
        let mut output = Vec::new();
        repl.run_with(Cursor::new("add a\nx\n"), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(text, "> Enter content (single line): added\n> ");
    }

    #[test]
    fn test_history() {
        let mut repl = repl();
        let out = session(&mut repl, "status\nhistory\n");
        assert_eq!(out, vec!["  1: status", "  2: history"]);
    }
}
