//! install, upgrade, uninstall and uninstall-full

use colored::Colorize;
use stencil_core::{ExecuteOptions, Mode};

use super::output::print_report;
use super::{Invocation, prepare};
use crate::error::Result;

/// Run a mutating command and return the process exit code.
pub fn run_apply(invocation: &Invocation, mode: Mode, dry_run: bool, verbose: bool) -> Result<i32> {
    let (reconciler, ctx) = prepare(invocation)?;

    if !invocation.json {
        let verb = if dry_run { "Planning" } else { "Running" };
        println!(
            "{} {verb} {} in {}",
            "=>".blue().bold(),
            mode.to_string().bold(),
            reconciler.root().display()
        );
    }

    let report = reconciler.run(mode, &ctx, ExecuteOptions { dry_run })?;

    if invocation.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, verbose);
    }
    Ok(report.exit_code())
}
