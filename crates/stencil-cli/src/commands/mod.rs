//! Command implementations for stencil-cli

pub mod apply;
pub mod check;
pub mod diff;
mod output;

pub use apply::run_apply;
pub use check::run_check;
pub use diff::run_diff;

use std::path::{Path, PathBuf};

use semver::Version;
use stencil_core::{ContextBuilder, MarkerContextBuilder, ProjectContext, Reconciler, load_manifest};

use crate::builtin::builtin_schema;
use crate::error::{CliError, Result};

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct Invocation {
    pub path: PathBuf,
    pub schema: Option<PathBuf>,
    pub json: bool,
}

/// Resolve the project root to an absolute path.
pub fn resolve_root(path: &Path) -> Result<PathBuf> {
    dunce::canonicalize(path).map_err(|e| {
        CliError::user(format!("Cannot open project root {}: {e}", path.display()))
    })
}

/// Version of this binary.
pub fn running_version() -> Result<Version> {
    Version::parse(env!("CARGO_PKG_VERSION"))
        .map_err(|e| CliError::user(format!("Invalid package version: {e}")))
}

/// Build the reconciler and project context for an invocation.
pub fn prepare(invocation: &Invocation) -> Result<(Reconciler, ProjectContext)> {
    let root = resolve_root(&invocation.path)?;
    let schema = match &invocation.schema {
        Some(manifest) => load_manifest(manifest)?,
        None => builtin_schema()?,
    };
    tracing::debug!(root = %root.display(), entries = schema.len(), "loaded schema");

    let ctx = MarkerContextBuilder::new().build(&root)?;
    let reconciler = Reconciler::new(root, schema, running_version()?)?;
    Ok((reconciler, ctx))
}
