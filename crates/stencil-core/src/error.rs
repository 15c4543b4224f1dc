//! Error types for stencil-core

use std::path::PathBuf;

use semver::Version;

use crate::schema::{Category, MergeStrategy};

/// Result type for stencil-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in stencil-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The schema is malformed; no plan can be computed
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The installed version forbids this operation
    #[error("Version error: {0}")]
    Version(#[from] VersionError),

    /// The executor was handed an action that breaks a category invariant
    #[error("Plan invariant violated for {path}: {message}")]
    PlanInvariant { path: String, message: String },

    /// Version record index could not be read or written
    #[error("Record store error at {path}: {message}")]
    RecordStore { path: PathBuf, message: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from stencil-fs
    #[error(transparent)]
    Fs(#[from] stencil_fs::Error),

    /// Merge error from stencil-blocks
    #[error(transparent)]
    Blocks(#[from] stencil_blocks::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    /// Whether this error means the operation was refused up front
    /// (invalid schema, downgrade) rather than failing midway.
    pub fn is_refusal(&self) -> bool {
        matches!(self, Self::Schema(_) | Self::Version(_))
    }
}

/// A schema entry is malformed
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("{path} is declared twice (as {first} and as {second})")]
    DuplicatePath {
        path: String,
        first: Category,
        second: Category,
    },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("{path} is reserved for engine state")]
    ReservedPath { path: String },

    #[error("{path} ({category}) overlaps preserved path {preserved}")]
    PreservedOverlap {
        path: String,
        category: Category,
        preserved: String,
    },

    #[error("{path} is {category} but has no producer")]
    MissingProducer { path: String, category: Category },

    #[error("{path} is shared but declares no merge strategy")]
    MissingMergeStrategy { path: String },

    #[error("{path} is {category}; merge strategy {strategy} is not allowed")]
    UnsupportedMergeStrategy {
        path: String,
        category: Category,
        strategy: MergeStrategy,
    },

    #[error("Invalid block key '{key}' for {path}")]
    InvalidBlockKey { path: String, key: String },

    #[error("Invalid owned key '{key}' for {path}: must be a JSON pointer starting with '/'")]
    InvalidOwnedKey { path: String, key: String },

    #[error("Producer for {path} returned an invalid fragment: {reason}")]
    InvalidFragment { path: String, reason: String },

    #[error("Template {template} referenced by {path} does not exist")]
    MissingTemplate { path: String, template: PathBuf },

    #[error("Invalid entry {path}: {reason}")]
    InvalidEntry { path: String, reason: String },

    #[error("Failed to parse schema manifest {path}: {message}")]
    ManifestParse { path: PathBuf, message: String },
}

/// The installed tool version forbids the requested operation
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("downgrade not supported: installed {installed} is newer than running {running}")]
    Downgrade { installed: Version, running: Version },

    #[error("Invalid version marker {path}: '{value}' ({reason})")]
    InvalidMarker {
        path: String,
        value: String,
        reason: String,
    },
}
