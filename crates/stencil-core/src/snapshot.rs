//! Read-only views of the target directory used during planning.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// What currently exists at a project-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileState {
    Absent,
    File(Vec<u8>),
    Directory,
    /// The path exists but could not be read
    Unreadable(String),
}

impl FileState {
    pub fn exists(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    pub fn content(&self) -> Option<&[u8]> {
        match self {
            Self::File(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// A read-only view of the project tree.
pub trait Snapshot {
    /// State of `path`, relative to the project root. A trailing `/` is
    /// ignored.
    fn state(&self, path: &str) -> FileState;
}

/// Snapshot backed by the real filesystem.
#[derive(Debug, Clone)]
pub struct DiskSnapshot {
    root: PathBuf,
}

impl DiskSnapshot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Snapshot for DiskSnapshot {
    fn state(&self, path: &str) -> FileState {
        let native = self.root.join(path.trim_end_matches('/'));
        match fs::metadata(&native) {
            Ok(meta) if meta.is_dir() => FileState::Directory,
            Ok(_) => match fs::read(&native) {
                Ok(bytes) => FileState::File(bytes),
                Err(e) => FileState::Unreadable(e.to_string()),
            },
            Err(e) if e.kind() == ErrorKind::NotFound => FileState::Absent,
            Err(e) => FileState::Unreadable(e.to_string()),
        }
    }
}

/// In-memory snapshot for tests and dry planning.
///
/// Directories are implied by any file beneath them.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshot {
    entries: BTreeMap<String, FileState>,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.entries
            .insert(path.into(), FileState::File(content.into()));
        self
    }

    pub fn with_dir(mut self, path: impl AsRef<str>) -> Self {
        self.entries.insert(
            path.as_ref().trim_end_matches('/').to_string(),
            FileState::Directory,
        );
        self
    }

    pub fn with_unreadable(mut self, path: impl Into<String>, message: impl Into<String>) -> Self {
        self.entries
            .insert(path.into(), FileState::Unreadable(message.into()));
        self
    }
}

impl Snapshot for MemorySnapshot {
    fn state(&self, path: &str) -> FileState {
        let path = path.trim_end_matches('/');
        if let Some(state) = self.entries.get(path) {
            return state.clone();
        }
        let prefix = format!("{path}/");
        if self.entries.keys().any(|k| k.starts_with(&prefix)) {
            FileState::Directory
        } else {
            FileState::Absent
        }
    }
}
