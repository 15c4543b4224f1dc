//! Version records: what the engine last wrote to each managed path.
//!
//! The index is read once before planning and written once after
//! execution. It is persisted as TOML at `.stencil/records.toml`:
//!
//! ```toml
//! version = "1"
//!
//! [records."AGENTS.md"]
//! checksum = "sha256:9f86d08..."
//! size = 412
//! tool_version = "0.3.0"
//! written_at = "2026-03-01T12:00:00Z"
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use semver::Version;
use serde::{Deserialize, Serialize};
use stencil_fs::{NormalizedPath, StatePath, checksum_matches, content_checksum, io};

use crate::{Error, Result};

/// Current record index format
const INDEX_FORMAT: &str = "1";

/// Snapshot of the content last generated for a managed path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// `sha256:<hex>` of the generated bytes
    pub checksum: String,
    pub size: u64,
    /// Tool version that wrote the file
    pub tool_version: Version,
    pub written_at: DateTime<Utc>,
}

impl VersionRecord {
    pub fn new(content: &[u8], tool_version: &Version) -> Self {
        Self {
            checksum: content_checksum(content),
            size: content.len() as u64,
            tool_version: tool_version.clone(),
            written_at: Utc::now(),
        }
    }

    /// Whether `content` is byte-for-byte what this record describes.
    pub fn matches(&self, content: &[u8]) -> bool {
        self.size == content.len() as u64 && checksum_matches(content, &self.checksum)
    }
}

/// All version records, keyed by project-relative path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordIndex {
    version: String,
    #[serde(default)]
    records: BTreeMap<String, VersionRecord>,
}

impl Default for RecordIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordIndex {
    pub fn new() -> Self {
        Self {
            version: INDEX_FORMAT.to_string(),
            records: BTreeMap::new(),
        }
    }

    pub fn get(&self, path: &str) -> Option<&VersionRecord> {
        self.records.get(path)
    }

    pub fn insert(&mut self, path: impl Into<String>, record: VersionRecord) -> Option<VersionRecord> {
        self.records.insert(path.into(), record)
    }

    pub fn remove(&mut self, path: &str) -> Option<VersionRecord> {
        self.records.remove(path)
    }

    /// Keep only records for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.records.retain(|path, _| keep(path));
    }

    pub fn contains(&self, path: &str) -> bool {
        self.records.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VersionRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Persistence for the record index.
///
/// Injected into the engine so tests can run without touching disk.
pub trait RecordStore {
    /// Load the index; a missing index is empty.
    fn load(&self) -> Result<RecordIndex>;

    /// Persist the index. An empty index removes any stored state.
    fn save(&self, index: &RecordIndex) -> Result<()>;
}

/// Record store at `<root>/.stencil/records.toml`.
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    root: PathBuf,
    path: PathBuf,
}

impl FileRecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let path = root.join(StatePath::RecordIndex.as_str());
        Self { root, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn store_error(&self, message: impl ToString) -> Error {
        Error::RecordStore {
            path: self.path.clone(),
            message: message.to_string(),
        }
    }
}

impl RecordStore for FileRecordStore {
    fn load(&self) -> Result<RecordIndex> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(RecordIndex::new()),
            Err(e) => return Err(self.store_error(e)),
        };
        file.lock_shared().map_err(|e| self.store_error(e))?;

        // Read through the locked handle
        let mut content = String::new();
        (&file)
            .read_to_string(&mut content)
            .map_err(|e| self.store_error(e))?;
        let index: RecordIndex = toml::from_str(&content).map_err(|e| self.store_error(e))?;

        if index.version != INDEX_FORMAT {
            return Err(self.store_error(format!(
                "unsupported record index format '{}'",
                index.version
            )));
        }

        tracing::debug!(path = %self.path.display(), records = index.len(), "loaded record index");
        Ok(index)
    }

    fn save(&self, index: &RecordIndex) -> Result<()> {
        let target = NormalizedPath::new(&self.path);

        if index.is_empty() {
            io::remove_path(&target).map_err(|e| self.store_error(e))?;
            // The state directory goes too once nothing else lives in it
            let _ = fs::remove_dir(self.root.join(StatePath::StateDir.as_str()));
            tracing::debug!(path = %self.path.display(), "removed empty record index");
            return Ok(());
        }

        let content = toml::to_string_pretty(index)?;
        io::write_atomic(&target, content.as_bytes()).map_err(|e| self.store_error(e))?;
        tracing::debug!(path = %self.path.display(), records = index.len(), "saved record index");
        Ok(())
    }
}

/// In-memory record store.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    index: RefCell<RecordIndex>,
    fail_saves: bool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(index: RecordIndex) -> Self {
        Self {
            index: RefCell::new(index),
            fail_saves: false,
        }
    }

    /// A store whose saves always fail.
    pub fn failing() -> Self {
        Self::new().with_failing_saves()
    }

    /// Make every later save fail, keeping the loaded index.
    pub fn with_failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    /// Copy of the currently stored index.
    pub fn snapshot(&self) -> RecordIndex {
        self.index.borrow().clone()
    }
}

impl RecordStore for MemoryRecordStore {
    fn load(&self) -> Result<RecordIndex> {
        Ok(self.index.borrow().clone())
    }

    fn save(&self, index: &RecordIndex) -> Result<()> {
        if self.fail_saves {
            return Err(Error::RecordStore {
                path: PathBuf::from("<memory>"),
                message: "store is read-only".to_string(),
            });
        }
        *self.index.borrow_mut() = index.clone();
        Ok(())
    }
}
