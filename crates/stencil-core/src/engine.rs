//! The reconciler facade
//!
//! Wires the version gate, planner and executor together for one
//! invocation. The record index is loaded once per call and handed to the
//! executor, which saves it once at the end.

use std::path::{Path, PathBuf};

use semver::Version;

use crate::context::ProjectContext;
use crate::error::Result;
use crate::execute::{ExecuteOptions, Executor};
use crate::gate::{check_version, read_installed_version, version_marker_entry};
use crate::mode::Mode;
use crate::plan::{Plan, compute_plan};
use crate::records::{FileRecordStore, RecordIndex, RecordStore};
use crate::report::ExecutionReport;
use crate::schema::Schema;
use crate::snapshot::DiskSnapshot;

/// Reconciles one project directory against a schema
pub struct Reconciler {
    root: PathBuf,
    schema: Schema,
    running: Version,
    store: Box<dyn RecordStore>,
}

impl Reconciler {
    /// Create a reconciler for `root` running as tool version `running`.
    ///
    /// The version marker is added to `schema` as an owned entry.
    ///
    /// # Errors
    ///
    /// Returns a schema error if `schema` already claims the marker path.
    pub fn new(root: impl Into<PathBuf>, schema: Schema, running: Version) -> Result<Self> {
        let root = root.into();
        let schema = schema.with_entry(version_marker_entry(&running))?;
        let store = Box::new(FileRecordStore::new(&root));
        Ok(Self {
            root,
            schema,
            running,
            store,
        })
    }

    /// Replace the record store.
    pub fn with_store(mut self, store: Box<dyn RecordStore>) -> Self {
        self.store = store;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn running_version(&self) -> &Version {
        &self.running
    }

    /// Compute the plan for `mode` without executing it.
    pub fn plan(&self, mode: Mode, ctx: &ProjectContext) -> Result<Plan> {
        self.prepare(mode, ctx).map(|(plan, _)| plan)
    }

    /// Plan and execute `mode`.
    pub fn run(
        &self,
        mode: Mode,
        ctx: &ProjectContext,
        options: ExecuteOptions,
    ) -> Result<ExecutionReport> {
        let (plan, records) = self.prepare(mode, ctx)?;
        tracing::info!(
            mode = %mode,
            actions = plan.actions.len(),
            dry_run = options.dry_run,
            "executing plan"
        );
        Executor::new(&self.root, &self.running, &*self.store).execute(&plan, records, options)
    }

    fn prepare(&self, mode: Mode, ctx: &ProjectContext) -> Result<(Plan, RecordIndex)> {
        let snapshot = DiskSnapshot::new(&self.root);
        let installed = read_installed_version(&snapshot)?;
        check_version(mode, installed.as_ref(), &self.running)?;

        let records = self.store.load()?;
        let plan = compute_plan(&self.schema, mode, ctx, &snapshot, &records)?;
        Ok((plan, records))
    }
}
