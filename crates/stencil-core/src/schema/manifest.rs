//! Schema manifests: a schema declared in TOML.
//!
//! # Example TOML
//!
//! ```toml
//! [[entry]]
//! path = "AGENTS.md"
//! category = "managed"
//! template = "templates/agents.md"
//!
//! [[entry]]
//! path = "package.json"
//! category = "shared"
//! merge = "json-merge"
//! content = '{ "scripts": { "lint": "eslint ." } }'
//! requires = ["eslint"]
//! when = { language = "javascript" }
//!
//! [[entry]]
//! path = "data/"
//! category = "preserved"
//! ```
//!
//! Template paths are resolved relative to the manifest's directory.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;

use super::{Category, Condition, MergeStrategy, Producer, Schema, SchemaEntry};
use crate::error::{Result, SchemaError};

/// Top-level manifest document
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    #[serde(default, rename = "entry")]
    entries: Vec<ManifestEntry>,
}

/// One `[[entry]]` table
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestEntry {
    path: String,
    category: Category,
    /// Template file, relative to the manifest
    #[serde(default)]
    template: Option<String>,
    /// Inline content
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    merge: MergeStrategy,
    #[serde(default)]
    block: Option<String>,
    #[serde(default)]
    owned_keys: Vec<String>,
    #[serde(default)]
    requires: Vec<String>,
    #[serde(default)]
    when: Condition,
}

/// Load and validate a schema manifest from disk.
pub fn load_manifest(path: &Path) -> Result<Schema> {
    let content = fs::read_to_string(path)
        .map_err(|e| stencil_fs::Error::io(path, e))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    tracing::debug!(manifest = %path.display(), "loading schema manifest");
    parse_manifest(&content, base_dir).map_err(|e| match e {
        crate::Error::Schema(SchemaError::ManifestParse { message, .. }) => {
            SchemaError::ManifestParse {
                path: path.to_path_buf(),
                message,
            }
            .into()
        }
        other => other,
    })
}

/// Parse a manifest, resolving templates against `base_dir`.
pub fn parse_manifest(content: &str, base_dir: &Path) -> Result<Schema> {
    let manifest: ManifestFile =
        toml::from_str(content).map_err(|e| SchemaError::ManifestParse {
            path: base_dir.to_path_buf(),
            message: e.message().to_string(),
        })?;

    let entries = manifest
        .entries
        .into_iter()
        .map(|entry| to_schema_entry(entry, base_dir))
        .collect::<Result<Vec<_>>>()?;

    Ok(Schema::new(entries)?)
}

fn to_schema_entry(raw: ManifestEntry, base_dir: &Path) -> Result<SchemaEntry> {
    let producer = match (raw.template, raw.content) {
        (Some(_), Some(_)) => {
            return Err(SchemaError::InvalidEntry {
                path: raw.path,
                reason: "declare either `template` or `content`, not both".to_string(),
            }
            .into());
        }
        (Some(template), None) => Some(read_template(&raw.path, base_dir, &template)?),
        (None, Some(content)) => Some(Producer::text(content)),
        (None, None) => None,
    };

    if producer.is_some() && !raw.category.needs_producer() {
        return Err(SchemaError::InvalidEntry {
            path: raw.path,
            reason: format!("{} entries carry no content", raw.category),
        }
        .into());
    }

    let mut entry = SchemaEntry::new(raw.path, raw.category)
        .with_merge(raw.merge)
        .with_condition(raw.when)
        .with_owned_keys(raw.owned_keys)
        .with_requires(raw.requires);
    entry.producer = producer;
    if let Some(block) = raw.block {
        entry = entry.with_block(block);
    }
    Ok(entry)
}

fn read_template(entry_path: &str, base_dir: &Path, template: &str) -> Result<Producer> {
    let template_path = base_dir.join(template);
    match fs::read(&template_path) {
        Ok(bytes) => Ok(Producer::bytes(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(SchemaError::MissingTemplate {
            path: entry_path.to_string(),
            template: template_path,
        }
        .into()),
        Err(e) => Err(stencil_fs::Error::io(template_path, e).into()),
    }
}
