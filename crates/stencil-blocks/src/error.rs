//! Error types for stencil-blocks

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Block '{key}' opened at line {line} is never closed")]
    UnterminatedBlock { key: String, line: usize },

    #[error("Block '{key}' not found")]
    BlockNotFound { key: String },

    #[error("Invalid block key '{key}': only letters, digits, '.', '-' and '_' are allowed")]
    InvalidKey { key: String },

    #[error("Block content line {line} is itself a block marker")]
    MarkerInBody { line: usize },

    #[error("Cannot merge a JSON {desired} into an existing {existing}")]
    RootMismatch {
        existing: &'static str,
        desired: &'static str,
    },

    #[error("Invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
}
