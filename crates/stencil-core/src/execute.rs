//! The plan executor.
//!
//! Applies a [`Plan`] action by action. Failures of single actions are
//! recorded and execution continues; category invariant violations abort
//! before anything is touched. The version marker is written last, and only
//! when every other action and the record index save succeeded.

use std::collections::BTreeSet;
use std::path::PathBuf;

use semver::Version;
use stencil_fs::{NormalizedPath, StatePath, io, validate_relative_path};

use crate::diff;
use crate::error::{Error, Result};
use crate::mode::Mode;
use crate::plan::{Action, ActionKind, Plan};
use crate::records::{RecordIndex, RecordStore, VersionRecord};
use crate::report::{ExecutionReport, Outcome, OutcomeStatus};
use crate::schema::Category;

/// Options for executing a plan
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteOptions {
    /// Preview only; the filesystem and record index stay untouched
    pub dry_run: bool,
}

impl ExecuteOptions {
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }
}

/// Applies plans to a project directory
pub struct Executor<'a> {
    root: PathBuf,
    running: &'a Version,
    store: &'a dyn RecordStore,
}

impl<'a> Executor<'a> {
    pub fn new(root: impl Into<PathBuf>, running: &'a Version, store: &'a dyn RecordStore) -> Self {
        Self {
            root: root.into(),
            running,
            store,
        }
    }

    /// Execute `plan` against the project, starting from `records`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PlanInvariant`] if the plan contains an action its
    /// category forbids. Every other failure, including a record index that
    /// cannot be saved, lands in the report.
    pub fn execute(
        &self,
        plan: &Plan,
        records: RecordIndex,
        options: ExecuteOptions,
    ) -> Result<ExecutionReport> {
        for action in &plan.actions {
            check_invariants(plan.mode, action)?;
        }

        let mut report = ExecutionReport::new(plan.mode, options.dry_run);
        report.missing_packages = plan.missing_packages.clone();

        if options.dry_run {
            for action in &plan.actions {
                let status = if action.kind.is_mutation() {
                    OutcomeStatus::Planned
                } else {
                    OutcomeStatus::Unchanged
                };
                report.push(Outcome::new(action, status).with_preview(diff::preview(action)));
            }
            return Ok(report);
        }

        let marker = StatePath::VersionMarker.as_str();
        let mut index = records;
        let mut index_changed = false;
        let mut managed_writes = Vec::new();
        let mut failed_deletes = BTreeSet::new();
        let mut marker_action = None;

        for action in &plan.actions {
            if !action.kind.is_mutation() {
                report.push(Outcome::new(action, OutcomeStatus::Unchanged));
                continue;
            }
            // The marker moves only once everything else has landed
            if action.path == marker {
                marker_action = Some(action);
                continue;
            }

            match self.apply(action) {
                Ok(()) => {
                    tracing::info!(kind = %action.kind, path = %action.path, "applied");
                    if action.category == Category::Managed
                        && action.kind.is_write()
                        && let Some(after) = &action.after
                    {
                        let record = VersionRecord::new(after, self.running);
                        index.insert(action.path.clone(), record);
                        managed_writes.push(action.path.clone());
                        index_changed = true;
                    }
                    if action.kind == ActionKind::Delete && index.remove(&action.path).is_some() {
                        index_changed = true;
                    }
                    report.push(Outcome::new(action, OutcomeStatus::Applied));
                }
                Err(e) => {
                    tracing::warn!(kind = %action.kind, path = %action.path, error = %e, "action failed");
                    if action.kind == ActionKind::Delete {
                        failed_deletes.insert(action.path.as_str());
                    }
                    report.push(Outcome::failed(action, e));
                }
            }
        }

        for path in &plan.stale_records {
            index_changed |= index.remove(path).is_some();
        }

        if plan.mode == Mode::UninstallFull {
            let before = index.len();
            index.retain(|path| failed_deletes.contains(path));
            index_changed |= index.len() != before;
        }

        if index_changed
            && let Err(e) = self.store.save(&index)
        {
            tracing::warn!(error = %e, "record index not saved");
            for path in &managed_writes {
                report.fail(path, format!("version record not saved: {e}"));
            }
            report.fail_run(format!("record index not saved: {e}"));
        }

        if let Some(action) = marker_action {
            if !report.is_success() {
                tracing::warn!(path = %action.path, "version marker left unchanged");
                report.push(Outcome::failed(
                    action,
                    "not updated because earlier actions failed",
                ));
            } else if let Err(e) = self.apply(action) {
                tracing::warn!(path = %action.path, error = %e, "action failed");
                report.push(Outcome::failed(action, e));
            } else {
                tracing::info!(kind = %action.kind, path = %action.path, "applied");
                report.push(Outcome::new(action, OutcomeStatus::Applied));
            }
        }

        Ok(report)
    }

    fn apply(&self, action: &Action) -> Result<()> {
        let target = NormalizedPath::new(&self.root).join(&action.path);
        match action.kind {
            ActionKind::Create | ActionKind::Update | ActionKind::Merge | ActionKind::Patch => {
                let content = action.after.as_deref().unwrap_or_default();
                io::write_atomic(&target, content)?;
            }
            ActionKind::Delete => {
                io::remove_path(&target)?;
                io::prune_empty_parents(&target, &self.root)?;
            }
            ActionKind::Skip | ActionKind::Warn => {}
        }
        Ok(())
    }
}

/// Reject actions that break the lifecycle of their category.
fn check_invariants(mode: Mode, action: &Action) -> Result<()> {
    let violation = |message: &str| Error::PlanInvariant {
        path: action.path.clone(),
        message: message.to_string(),
    };

    if validate_relative_path(&action.path).is_err() {
        return Err(violation("path escapes the project root"));
    }

    let kind = action.kind;
    match action.category {
        Category::Preserved if kind.is_mutation() => {
            Err(violation("preserved paths are never modified"))
        }
        Category::Shared if kind == ActionKind::Delete => {
            Err(violation("shared files are never deleted"))
        }
        Category::Deprecated if kind.is_write() => {
            Err(violation("deprecated paths are only ever deleted"))
        }
        Category::Deprecated if kind == ActionKind::Delete && mode == Mode::Install => {
            Err(violation("deprecated paths are not removed during install"))
        }
        Category::Managed if kind == ActionKind::Delete && mode != Mode::UninstallFull => {
            Err(violation("managed files are only deleted by uninstall-full"))
        }
        _ if kind.is_write() && action.after.is_none() => {
            Err(violation("write action carries no content"))
        }
        _ => Ok(()),
    }
}
