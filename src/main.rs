//! twig - command-line entry point.

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use twig::shell::{Action, CliOptions, Repl, ShellResult};
use twig::storage::Repository;

fn main() -> ExitCode {
    let options = match CliOptions::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Try 'twig --help' for more information.");
            return ExitCode::FAILURE;
        }
    };

    init_logging(options.verbose);

    let result = match options.action.clone() {
        Action::Help => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Action::Version => {
            println!("twig v{}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        Action::Execute(script) => run_script(options, &script),
        Action::Repl => run_repl(options),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; `RUST_LOG` wins over the verbosity flag.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_help() {
    println!("twig - an in-memory version-control engine");
    println!();
    println!("Usage: twig [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -e, --execute SCRIPT   Run ';'-separated commands and exit");
    println!("  -b, --branch NAME      Default branch name (default: master)");
    println!("  --ulid                 Use ULID commit ids instead of a counter");
    println!("  --json                 Print 'show' dumps as JSON");
    println!("  -v, --verbose          Enable debug logging");
    println!("  -h, --help             Show this help message");
    println!("  --version              Show version");
    println!();
    println!("Examples:");
    println!("  twig                                          Start the REPL");
    println!("  twig -e 'add a.txt; hello; commit one; log'   Run a script and exit");
}

fn run_script(options: CliOptions, script: &str) -> ShellResult<()> {
    let repo = Repository::with_config(options.repository);
    let mut repl = Repl::with_config(repo, options.repl.quiet());
    let stdout = std::io::stdout();
    repl.run_script(script, stdout.lock())
}

fn run_repl(options: CliOptions) -> ShellResult<()> {
    let repo = Repository::with_config(options.repository);
    let mut repl = Repl::with_config(repo, options.repl);
    repl.run()
}
