//! Error types for stencil-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from stencil-core
    #[error(transparent)]
    Core(#[from] stencil_core::Error),

    /// Schema errors raised while assembling the built-in schema
    #[error(transparent)]
    Schema(#[from] stencil_core::SchemaError),

    /// JSON output error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    ///
    /// Refusals (invalid schema, downgrade, bad version marker) exit with
    /// `2`; everything else with `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Core(e) if e.is_refusal() => 2,
            Self::Schema(_) => 2,
            _ => 1,
        }
    }
}
