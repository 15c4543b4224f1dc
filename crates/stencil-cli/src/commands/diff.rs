//! diff: preview the changes an upgrade would make

use colored::Colorize;
use stencil_core::{ExecuteOptions, Mode, OutcomeStatus};

use super::output::print_diff;
use super::{Invocation, prepare};
use crate::error::Result;

/// Run the upgrade plan as a dry run and print every preview.
pub fn run_diff(invocation: &Invocation) -> Result<i32> {
    let (reconciler, ctx) = prepare(invocation)?;
    let report = reconciler.run(Mode::Upgrade, &ctx, ExecuteOptions::dry_run())?;

    if invocation.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(0);
    }

    let mut pending = 0;
    for outcome in report.outcomes.iter().filter(|o| o.status == OutcomeStatus::Planned) {
        pending += 1;
        match outcome.preview.as_deref() {
            Some(preview) if preview.starts_with("---") => print_diff(preview),
            Some(preview) => println!("{}", preview.bold()),
            None => println!("{} {}", outcome.kind, outcome.path),
        }
    }

    if pending == 0 {
        println!(
            "{} No changes needed. Project is up to date.",
            "OK".green().bold()
        );
    }
    Ok(0)
}
