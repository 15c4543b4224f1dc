//! Entry conditions: predicates over the project context.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::context::ProjectContext;

type PredicateFn = dyn Fn(&ProjectContext) -> bool + Send + Sync;

/// Decides whether an entry applies to the current project.
///
/// In a schema manifest conditions are written as inline tables:
///
/// ```toml
/// when = { all = [{ language = "typescript" }, { not = { tool = "biome" } }] }
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    #[default]
    Always,
    /// A language was detected
    Language(String),
    /// A framework was detected
    Framework(String),
    /// A tool configuration is already present
    Tool(String),
    Not(Box<Condition>),
    All(Vec<Condition>),
    Any(Vec<Condition>),
    /// Arbitrary predicate, only available from code
    #[serde(skip)]
    Custom(Arc<PredicateFn>),
}

impl Condition {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&ProjectContext) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn evaluate(&self, ctx: &ProjectContext) -> bool {
        match self {
            Self::Always => true,
            Self::Language(name) => ctx.has_language(name),
            Self::Framework(name) => ctx.has_framework(name),
            Self::Tool(name) => ctx.has_tool(name),
            Self::Not(inner) => !inner.evaluate(ctx),
            Self::All(conditions) => conditions.iter().all(|c| c.evaluate(ctx)),
            Self::Any(conditions) => conditions.iter().any(|c| c.evaluate(ctx)),
            Self::Custom(predicate) => predicate(ctx),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("Always"),
            Self::Language(name) => f.debug_tuple("Language").field(name).finish(),
            Self::Framework(name) => f.debug_tuple("Framework").field(name).finish(),
            Self::Tool(name) => f.debug_tuple("Tool").field(name).finish(),
            Self::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
            Self::All(items) => f.debug_tuple("All").field(items).finish(),
            Self::Any(items) => f.debug_tuple("Any").field(items).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
