//! Schema entries: one managed path each.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::condition::Condition;
use crate::context::ProjectContext;

/// Default marker key for text-patch blocks
pub const DEFAULT_BLOCK_KEY: &str = "stencil";

/// Lifecycle category of a managed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Fully tool-controlled, regenerated on every run
    Owned,
    /// Tool-generated, overwritten only while provably unedited
    Managed,
    /// User document the tool only merges fragments into
    Shared,
    /// User data the engine never touches
    Preserved,
    /// Left over from an earlier schema, removed on upgrade/uninstall
    Deprecated,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owned => "owned",
            Self::Managed => "managed",
            Self::Shared => "shared",
            Self::Preserved => "preserved",
            Self::Deprecated => "deprecated",
        }
    }

    /// Whether entries of this category carry content.
    pub fn needs_producer(self) -> bool {
        matches!(self, Self::Owned | Self::Managed | Self::Shared)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How produced content is combined with an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// Whole-file content
    #[default]
    None,
    /// Deep-merge a JSON fragment
    JsonMerge,
    /// Replace a marker-delimited block
    TextPatch,
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::JsonMerge => "json-merge",
            Self::TextPatch => "text-patch",
        })
    }
}

type GeneratorFn = dyn Fn(&ProjectContext) -> Vec<u8> + Send + Sync;

/// Source of an entry's content. Opaque to the planner, which only
/// compares the bytes it yields.
#[derive(Clone)]
pub enum Producer {
    /// Fixed content, e.g. a template file
    Static(Arc<[u8]>),
    /// Content computed from the project context
    Generated(Arc<GeneratorFn>),
}

impl Producer {
    /// Static content from text.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Static(Arc::from(content.into().into_bytes()))
    }

    /// Static content from raw bytes.
    pub fn bytes(content: impl Into<Vec<u8>>) -> Self {
        Self::Static(Arc::from(content.into()))
    }

    /// Content generated from the project context.
    pub fn generated<F>(f: F) -> Self
    where
        F: Fn(&ProjectContext) -> Vec<u8> + Send + Sync + 'static,
    {
        Self::Generated(Arc::new(f))
    }

    /// Run the producer.
    pub fn produce(&self, ctx: &ProjectContext) -> Vec<u8> {
        match self {
            Self::Static(bytes) => bytes.to_vec(),
            Self::Generated(generate) => generate(ctx),
        }
    }
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(bytes) => write!(f, "Static({} bytes)", bytes.len()),
            Self::Generated(_) => f.write_str("Generated(..)"),
        }
    }
}

/// One path under the engine's control.
#[derive(Debug, Clone)]
pub struct SchemaEntry {
    /// Path relative to the project root; a trailing `/` marks a directory
    pub path: String,
    pub category: Category,
    pub producer: Option<Producer>,
    pub merge: MergeStrategy,
    pub condition: Condition,
    /// Marker key for text-patch blocks
    pub block: String,
    /// JSON pointers the tool owns inside a json-merge fragment
    pub owned_keys: Vec<String>,
    /// External packages this entry expects to be installed
    pub requires: Vec<String>,
}

impl SchemaEntry {
    pub fn new(path: impl Into<String>, category: Category) -> Self {
        Self {
            path: path.into(),
            category,
            producer: None,
            merge: MergeStrategy::None,
            condition: Condition::Always,
            block: DEFAULT_BLOCK_KEY.to_string(),
            owned_keys: Vec::new(),
            requires: Vec::new(),
        }
    }

    pub fn owned(path: impl Into<String>, producer: Producer) -> Self {
        Self::new(path, Category::Owned).with_producer(producer)
    }

    pub fn managed(path: impl Into<String>, producer: Producer) -> Self {
        Self::new(path, Category::Managed).with_producer(producer)
    }

    pub fn shared(path: impl Into<String>, merge: MergeStrategy, producer: Producer) -> Self {
        let mut entry = Self::new(path, Category::Shared).with_producer(producer);
        entry.merge = merge;
        entry
    }

    pub fn preserved(path: impl Into<String>) -> Self {
        Self::new(path, Category::Preserved)
    }

    pub fn deprecated(path: impl Into<String>) -> Self {
        Self::new(path, Category::Deprecated)
    }

    pub fn with_producer(mut self, producer: Producer) -> Self {
        self.producer = Some(producer);
        self
    }

    pub fn with_merge(mut self, merge: MergeStrategy) -> Self {
        self.merge = merge;
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub fn with_block(mut self, key: impl Into<String>) -> Self {
        self.block = key.into();
        self
    }

    pub fn with_owned_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.owned_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_requires<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires = packages.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this entry applies to the given project.
    pub fn applies(&self, ctx: &ProjectContext) -> bool {
        self.condition.evaluate(ctx)
    }

    /// Whether this entry names a directory.
    pub fn is_directory(&self) -> bool {
        self.path.ends_with('/')
    }

    /// The path without a directory marker, as used for filesystem access.
    pub fn target(&self) -> &str {
        self.path.trim_end_matches('/')
    }

    /// Run the producer, if any.
    pub fn produce(&self, ctx: &ProjectContext) -> Option<Vec<u8>> {
        self.producer.as_ref().map(|p| p.produce(ctx))
    }
}
