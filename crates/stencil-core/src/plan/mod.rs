//! Plans: the ordered actions computed before anything is mutated.

mod action;
mod compute;

pub use action::{Action, ActionKind, Reason, compare_actions};
pub use compute::compute_plan;

use std::fmt;

use serde::Serialize;

use crate::mode::Mode;

/// The deterministic outcome of planning one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub mode: Mode,
    pub actions: Vec<Action>,
    /// Packages required by active entries but not installed
    pub missing_packages: Vec<String>,
    /// Recorded paths with no active entry and no file left on disk
    #[serde(skip)]
    pub stale_records: Vec<String>,
}

impl Plan {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            actions: Vec::new(),
            missing_packages: Vec::new(),
            stale_records: Vec::new(),
        }
    }

    /// Actions that would touch the filesystem.
    pub fn changes(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter().filter(|a| a.kind.is_mutation())
    }

    pub fn has_changes(&self) -> bool {
        self.changes().next().is_some()
    }

    /// Actions that carry a warning.
    pub fn warnings(&self) -> impl Iterator<Item = &Action> {
        self.actions
            .iter()
            .filter(|a| a.kind == ActionKind::Warn || a.reason.is_warning())
    }

    pub fn get(&self, path: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.path == path)
    }

    pub fn count(&self, kind: ActionKind) -> usize {
        self.actions.iter().filter(|a| a.kind == kind).count()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "plan ({})", self.mode)?;
        for action in &self.actions {
            writeln!(f, "  {action}")?;
        }
        if !self.missing_packages.is_empty() {
            writeln!(f, "missing packages: {}", self.missing_packages.join(", "))?;
        }
        Ok(())
    }
}
