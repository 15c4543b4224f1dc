//! Version gate: refuse upgrades that would downgrade an installation.

use semver::Version;
use stencil_fs::StatePath;

use crate::error::{Result, VersionError};
use crate::mode::Mode;
use crate::schema::{Producer, SchemaEntry};
use crate::snapshot::{FileState, Snapshot};

/// Read the installed tool version from the version marker.
///
/// A missing marker means nothing is installed. A marker that is not a
/// semver string is an error rather than being ignored, since guessing
/// could let a downgrade through.
pub fn read_installed_version(snapshot: &dyn Snapshot) -> Result<Option<Version>> {
    let path = StatePath::VersionMarker.as_str();
    let invalid = |value: String, reason: String| VersionError::InvalidMarker {
        path: path.to_string(),
        value,
        reason,
    };

    let bytes = match snapshot.state(path) {
        FileState::Absent => return Ok(None),
        FileState::File(bytes) => bytes,
        FileState::Directory => {
            return Err(invalid(String::new(), "marker is a directory".to_string()).into());
        }
        FileState::Unreadable(message) => return Err(invalid(String::new(), message).into()),
    };

    let text = String::from_utf8_lossy(&bytes);
    let value = text.trim();
    Version::parse(value)
        .map(Some)
        .map_err(|e| invalid(value.to_string(), e.to_string()).into())
}

/// Check whether `mode` may run given the installed and running versions.
///
/// Only `upgrade` is gated.
pub fn check_version(
    mode: Mode,
    installed: Option<&Version>,
    running: &Version,
) -> std::result::Result<(), VersionError> {
    match installed {
        Some(installed) if mode == Mode::Upgrade && installed > running => {
            Err(VersionError::Downgrade {
                installed: installed.clone(),
                running: running.clone(),
            })
        }
        _ => Ok(()),
    }
}

/// Content of the version marker for `version`.
pub fn marker_content(version: &Version) -> String {
    format!("{version}\n")
}

/// The synthetic owned entry that keeps the version marker current.
pub fn version_marker_entry(version: &Version) -> SchemaEntry {
    SchemaEntry::owned(
        StatePath::VersionMarker.as_str(),
        Producer::text(marker_content(version)),
    )
}
