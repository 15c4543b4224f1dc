//! Customization detection for managed files.

use serde::Serialize;

use crate::records::VersionRecord;

/// How a managed file relates to what the engine last wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Customization {
    /// Identical to the last generated content
    Unedited,
    /// Changed since the engine wrote it
    Edited,
    /// No record exists, so the file's origin is unknown
    UnknownProvenance,
}

impl Customization {
    /// Edited and unknown files are both treated as user-owned.
    pub fn is_customized(self) -> bool {
        !matches!(self, Self::Unedited)
    }
}

/// Classify `current` against the record for its path.
pub fn detect(current: &[u8], record: Option<&VersionRecord>) -> Customization {
    match record {
        None => Customization::UnknownProvenance,
        Some(record) if record.matches(current) => Customization::Unedited,
        Some(_) => Customization::Edited,
    }
}
