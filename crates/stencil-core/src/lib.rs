//! Stencil core: declarative schema reconciliation
//!
//! Given a schema of managed paths and the current state of a project
//! directory, the engine computes a deterministic [`Plan`] of file actions
//! and applies it safely.
//!
//! # Layers
//!
//! - [`schema`]: validated entries and the TOML manifest loader
//! - [`context`]: what is known about the project
//! - [`plan`]: the pure plan computer
//! - [`execute`]: applies plans, maintains [`records`]
//! - [`engine`]: the [`Reconciler`] facade used by the CLI
//!
//! # Example
//!
//! ```no_run
//! use semver::Version;
//! use stencil_core::{ExecuteOptions, Mode, ProjectContext, Producer, Reconciler, Schema, SchemaEntry};
//!
//! let schema = Schema::new(vec![
//!     SchemaEntry::owned(".stencil/README.md", Producer::text("Managed by stencil\n")),
//!     SchemaEntry::preserved(".stencil/data/"),
//! ])?;
//! let reconciler = Reconciler::new(".", schema, Version::new(0, 1, 0))?;
//! let report = reconciler.run(Mode::Install, &ProjectContext::new("."), ExecuteOptions::default())?;
//! assert!(report.is_success());
//! # Ok::<(), stencil_core::Error>(())
//! ```

pub mod context;
pub mod detect;
pub mod diff;
pub mod engine;
pub mod error;
pub mod execute;
pub mod gate;
pub mod mode;
pub mod plan;
pub mod records;
pub mod report;
pub mod schema;
pub mod snapshot;

pub use context::{ContextBuilder, Detection, MarkerContextBuilder, ProjectContext};
pub use detect::{Customization, detect};
pub use engine::Reconciler;
pub use error::{Error, Result, SchemaError, VersionError};
pub use execute::{ExecuteOptions, Executor};
pub use mode::Mode;
pub use plan::{Action, ActionKind, Plan, Reason, compute_plan};
pub use records::{FileRecordStore, MemoryRecordStore, RecordIndex, RecordStore, VersionRecord};
pub use report::{ExecutionReport, Outcome, OutcomeStatus, ReportStatus};
pub use schema::{
    Category, Condition, MergeStrategy, Producer, Schema, SchemaEntry, load_manifest,
    parse_manifest,
};
pub use snapshot::{DiskSnapshot, FileState, MemorySnapshot, Snapshot};
