//! Schema model: the static description of every path the engine manages.
//!
//! A [`Schema`] can only be built through validation, so every schema the
//! planner sees satisfies:
//! - paths are canonical and relative to the project root
//! - each path appears in exactly one entry
//! - no entry lies at or beneath a preserved path, or contains one
//! - producers and merge strategies match the entry's category

mod condition;
mod entry;
pub mod manifest;

pub use condition::Condition;
pub use entry::{Category, DEFAULT_BLOCK_KEY, MergeStrategy, Producer, SchemaEntry};
pub use manifest::{load_manifest, parse_manifest};

use std::collections::HashMap;

use stencil_fs::{StatePath, is_within, validate_relative_path};

use crate::error::SchemaError;

/// A validated set of schema entries.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entries: Vec<SchemaEntry>,
}

impl Schema {
    /// Validate `entries` and build a schema.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] found.
    pub fn new(entries: Vec<SchemaEntry>) -> Result<Self, SchemaError> {
        let entries = entries
            .into_iter()
            .map(validate_entry)
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen: HashMap<&str, Category> = HashMap::new();
        for entry in &entries {
            if let Some(first) = seen.insert(entry.target(), entry.category) {
                return Err(SchemaError::DuplicatePath {
                    path: entry.target().to_string(),
                    first,
                    second: entry.category,
                });
            }
        }

        for preserved in entries.iter().filter(|e| e.category == Category::Preserved) {
            for entry in entries.iter().filter(|e| e.category != Category::Preserved) {
                if is_within(&entry.path, &preserved.path)
                    || is_within(&preserved.path, &entry.path)
                {
                    return Err(SchemaError::PreservedOverlap {
                        path: entry.path.clone(),
                        category: entry.category,
                        preserved: preserved.path.clone(),
                    });
                }
            }
        }

        Ok(Self { entries })
    }

    /// Return a new schema with one more entry, re-validating the whole set.
    pub fn with_entry(self, entry: SchemaEntry) -> Result<Self, SchemaError> {
        let mut entries = self.entries;
        entries.push(entry);
        Self::new(entries)
    }

    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    /// Look up the entry for `path` (with or without a trailing `/`).
    pub fn get(&self, path: &str) -> Option<&SchemaEntry> {
        let path = path.trim_end_matches('/');
        self.entries.iter().find(|e| e.target() == path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_entry(mut entry: SchemaEntry) -> Result<SchemaEntry, SchemaError> {
    entry.path = validate_relative_path(&entry.path).map_err(|e| SchemaError::InvalidPath {
        path: entry.path.clone(),
        reason: e.to_string(),
    })?;

    let target = entry.target();
    if target == StatePath::StateDir.as_str() || target == StatePath::RecordIndex.as_str() {
        return Err(SchemaError::ReservedPath {
            path: entry.path.clone(),
        });
    }

    if entry.is_directory()
        && !matches!(entry.category, Category::Preserved | Category::Deprecated)
    {
        return Err(SchemaError::InvalidPath {
            path: entry.path.clone(),
            reason: format!("{} entries must name files, not directories", entry.category),
        });
    }

    if entry.category.needs_producer() && entry.producer.is_none() {
        return Err(SchemaError::MissingProducer {
            path: entry.path.clone(),
            category: entry.category,
        });
    }

    match (entry.category, entry.merge) {
        (Category::Shared, MergeStrategy::None) => {
            return Err(SchemaError::MissingMergeStrategy {
                path: entry.path.clone(),
            });
        }
        (Category::Shared | Category::Managed, _) | (_, MergeStrategy::None) => {}
        (category, strategy) => {
            return Err(SchemaError::UnsupportedMergeStrategy {
                path: entry.path.clone(),
                category,
                strategy,
            });
        }
    }

    if entry.category == Category::Shared
        && entry.merge == MergeStrategy::TextPatch
        && stencil_blocks::parser::validate_key(&entry.block).is_err()
    {
        return Err(SchemaError::InvalidBlockKey {
            path: entry.path.clone(),
            key: entry.block.clone(),
        });
    }

    if let Some(key) = entry.owned_keys.iter().find(|k| !k.starts_with('/')) {
        return Err(SchemaError::InvalidOwnedKey {
            path: entry.path.clone(),
            key: key.clone(),
        });
    }

    Ok(entry)
}
