//! Stencil CLI
//!
//! Thin wrapper around the reconciliation engine: selects a mode, runs it
//! against a project directory and maps the outcome to an exit code.

mod builtin;
mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::Invocation;
use error::Result;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Install a stderr subscriber when `--verbose` is passed or `RUST_LOG` is set.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => return,
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
    tracing::debug!("tracing enabled");
}

fn run(cli: Cli) -> Result<i32> {
    let invocation = Invocation {
        path: cli.path,
        schema: cli.schema,
        json: cli.json,
    };

    match cli.command.mode() {
        Some((mode, dry_run)) => commands::run_apply(&invocation, mode, dry_run, cli.verbose),
        None if cli.command == Commands::Diff => commands::run_diff(&invocation),
        None => commands::run_check(&invocation),
    }
}
