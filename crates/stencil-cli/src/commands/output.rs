//! Human-readable report rendering

use colored::Colorize;
use stencil_core::{ActionKind, ExecutionReport, Outcome, OutcomeStatus};

fn kind_label(kind: ActionKind) -> String {
    let label = format!("{kind:<6}");
    match kind {
        ActionKind::Create => label.green().to_string(),
        ActionKind::Update | ActionKind::Merge | ActionKind::Patch => label.yellow().to_string(),
        ActionKind::Delete => label.red().to_string(),
        ActionKind::Skip => label.dimmed().to_string(),
        ActionKind::Warn => label.magenta().to_string(),
    }
}

fn print_outcome(outcome: &Outcome) {
    let reason = outcome.reason.to_string();
    let reason = if outcome.is_warning() {
        reason.yellow().to_string()
    } else {
        reason.dimmed().to_string()
    };
    println!(
        "   {} {} ({}) {}",
        kind_label(outcome.kind),
        outcome.path.cyan(),
        outcome.category,
        reason
    );
    if let Some(error) = &outcome.error {
        println!("          {} {}", "failed:".red().bold(), error);
    }
}

/// Colorize a unified diff line by line.
pub fn print_diff(diff: &str) {
    for line in diff.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            println!("{}", line.bold());
        } else if line.starts_with('+') {
            println!("{}", line.green());
        } else if line.starts_with('-') {
            println!("{}", line.red());
        } else if line.starts_with("@@") {
            println!("{}", line.cyan());
        } else {
            println!("{line}");
        }
    }
}

/// Print a report: applied or planned changes first, then warnings and
/// failures, then a summary line.
pub fn print_report(report: &ExecutionReport, verbose: bool) {
    for outcome in &report.outcomes {
        let noisy = outcome.status == OutcomeStatus::Unchanged && !outcome.is_warning();
        if noisy && !verbose {
            continue;
        }
        print_outcome(outcome);
    }

    if !report.missing_packages.is_empty() {
        println!();
        println!(
            "{} required packages not installed: {}",
            "NOTE".yellow().bold(),
            report.missing_packages.join(", ")
        );
    }

    println!();
    let changed = report.changed().count();
    let failed = report.failed_paths();
    if !report.is_success() {
        println!(
            "{} {} action(s) failed:",
            "PARTIAL".red().bold(),
            failed.len()
        );
        for path in failed {
            println!("   {} {}", "-".red(), path);
        }
        for error in &report.errors {
            println!("   {} {}", "-".red(), error);
        }
    } else if report.dry_run {
        println!(
            "{} {changed} change(s) would be applied ({}).",
            "DRY RUN".blue().bold(),
            report.mode
        );
    } else if changed == 0 {
        println!("{} Nothing to do.", "OK".green().bold());
    } else {
        println!(
            "{} {changed} change(s) applied ({}).",
            "OK".green().bold(),
            report.mode
        );
    }
}
