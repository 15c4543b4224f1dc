//! check: summarize what an upgrade would do

use colored::Colorize;
use serde_json::json;
use stencil_core::{ActionKind, Mode};

use super::{Invocation, prepare};
use crate::error::Result;

/// Compute the upgrade plan and report it without executing anything.
pub fn run_check(invocation: &Invocation) -> Result<i32> {
    let (reconciler, ctx) = prepare(invocation)?;
    let plan = reconciler.plan(Mode::Upgrade, &ctx)?;

    if invocation.json {
        let output = json!({
            "has_changes": plan.has_changes(),
            "plan": plan,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(0);
    }

    println!(
        "{} Checking {}",
        "=>".blue().bold(),
        reconciler.root().display()
    );
    for action in plan.changes() {
        println!(
            "   {} {} ({})",
            action.kind.to_string().yellow(),
            action.path.cyan(),
            action.reason
        );
    }
    for action in plan.warnings() {
        println!(
            "   {} {}: {}",
            "warning".magenta(),
            action.path.cyan(),
            action.reason
        );
    }
    for package in &plan.missing_packages {
        println!("   {} {} is not installed", "note".yellow(), package);
    }

    let skipped = plan.count(ActionKind::Skip);
    if plan.has_changes() {
        println!();
        println!(
            "{} {} change(s) pending. Run {} to apply.",
            "DRIFTED".yellow().bold(),
            plan.changes().count(),
            "stencil upgrade".cyan()
        );
    } else {
        println!(
            "{} Up to date ({skipped} path(s) checked).",
            "OK".green().bold()
        );
    }
    Ok(0)
}
