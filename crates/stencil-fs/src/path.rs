//! Normalized path handling for cross-platform compatibility

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// A path normalized to use forward slashes internally.
///
/// Provides consistent path handling across platforms by normalizing
/// all paths to forward slashes internally and converting to
/// platform-native format only at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    ///
    /// Converts backslashes to forward slashes for internal storage.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        let normalized = path_str.replace('\\', "/");
        Self { inner: normalized }
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        let segment_normalized = segment.replace('\\', "/");
        let segment_normalized = segment_normalized.trim_end_matches('/');
        if segment_normalized.is_empty() {
            return self.clone();
        }
        let joined = if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment_normalized)
        } else {
            format!("{}/{}", self.inner, segment_normalized)
        };
        Self { inner: joined }
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner)
    }
}

/// Validate and canonicalize a project-relative path.
///
/// Accepts forward or backward slashes, strips a leading `./` and collapses
/// repeated separators. A trailing `/` is kept, since it marks a directory
/// entry. Rejects empty, absolute and parent-escaping paths.
pub fn validate_relative_path(raw: &str) -> Result<String> {
    let invalid = |reason: &str| Error::InvalidPath {
        path: raw.to_string(),
        reason: reason.to_string(),
    };

    let unified = raw.replace('\\', "/");
    if unified.starts_with('/') || unified.chars().nth(1) == Some(':') {
        return Err(invalid("path must be relative to the project root"));
    }

    let is_dir = unified.ends_with('/');
    let mut parts = Vec::new();
    for part in unified.split('/') {
        match part {
            "" | "." => continue,
            ".." => return Err(invalid("path must not contain '..'")),
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return Err(invalid("path is empty"));
    }

    let mut cleaned = parts.join("/");
    if is_dir {
        cleaned.push('/');
    }
    Ok(cleaned)
}

/// Whether `path` equals `dir` or lies beneath it.
///
/// Both arguments are canonical relative paths as returned by
/// [`validate_relative_path`].
pub fn is_within(path: &str, dir: &str) -> bool {
    let dir = dir.trim_end_matches('/');
    let path = path.trim_end_matches('/');
    path == dir || path.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
}
