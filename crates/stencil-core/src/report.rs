//! Execution reports
//!
//! Every run, dry or not, ends in an [`ExecutionReport`] naming each path
//! that was touched, skipped or failed.

use serde::Serialize;

use crate::mode::Mode;
use crate::plan::{Action, ActionKind, Reason};
use crate::schema::Category;

/// What happened to a single action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// The action was applied to disk
    Applied,
    /// Dry run: the action would be applied
    Planned,
    /// Nothing to do (skip and warn actions)
    Unchanged,
    /// Applying the action failed
    Failed,
}

/// Overall result of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Success,
    /// Some actions failed, the rest were applied
    Partial,
}

/// Result of one planned action
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub kind: ActionKind,
    pub path: String,
    pub category: Category,
    pub reason: Reason,
    pub status: OutcomeStatus,
    /// Dry-run preview (diff or summary)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    /// Error message for failed actions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Outcome {
    pub fn new(action: &Action, status: OutcomeStatus) -> Self {
        Self {
            kind: action.kind,
            path: action.path.clone(),
            category: action.category,
            reason: action.reason.clone(),
            status,
            preview: None,
            error: None,
        }
    }

    pub fn with_preview(mut self, preview: String) -> Self {
        self.preview = Some(preview);
        self
    }

    pub fn failed(action: &Action, error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(action, OutcomeStatus::Failed)
        }
    }

    pub fn is_warning(&self) -> bool {
        self.kind == ActionKind::Warn || self.reason.is_warning()
    }
}

/// Report from executing (or previewing) a plan
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub mode: Mode,
    pub dry_run: bool,
    pub status: ReportStatus,
    pub outcomes: Vec<Outcome>,
    pub missing_packages: Vec<String>,
    /// Failures not tied to a single action
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ExecutionReport {
    pub fn new(mode: Mode, dry_run: bool) -> Self {
        Self {
            mode,
            dry_run,
            status: ReportStatus::Success,
            outcomes: Vec::new(),
            missing_packages: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: Outcome) {
        if outcome.status == OutcomeStatus::Failed {
            self.status = ReportStatus::Partial;
        }
        self.outcomes.push(outcome);
    }

    /// Mark an already recorded outcome as failed.
    pub fn fail(&mut self, path: &str, error: impl ToString) {
        let message = error.to_string();
        for outcome in self.outcomes.iter_mut().filter(|o| o.path == path) {
            outcome.status = OutcomeStatus::Failed;
            outcome.error = Some(message.clone());
        }
        self.status = ReportStatus::Partial;
    }

    /// Record a failure of the run as a whole.
    pub fn fail_run(&mut self, error: impl ToString) {
        self.errors.push(error.to_string());
        self.status = ReportStatus::Partial;
    }

    pub fn is_success(&self) -> bool {
        self.status == ReportStatus::Success
    }

    pub fn failed_paths(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Failed)
            .map(|o| o.path.as_str())
            .collect()
    }

    /// Outcomes that changed (or in a dry run, would change) the project.
    pub fn changed(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Applied | OutcomeStatus::Planned))
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|o| o.is_warning())
    }

    /// Process exit code: `0` on success, `1` if any action failed.
    pub fn exit_code(&self) -> i32 {
        match self.status {
            ReportStatus::Success => 0,
            ReportStatus::Partial => 1,
        }
    }
}
