//! Paths of the persisted engine state, relative to the project root.

/// Locations inside the hidden state directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatePath {
    /// The `.stencil` directory holding all engine state
    StateDir,
    /// Installed tool version marker
    VersionMarker,
    /// Index of version records, keyed by managed path
    RecordIndex,
}

impl StatePath {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StateDir => ".stencil",
            Self::VersionMarker => ".stencil/version",
            Self::RecordIndex => ".stencil/records.toml",
        }
    }
}
