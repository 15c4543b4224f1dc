//! Project context: what the planner knows about the target project.
//!
//! The context is resolved once per invocation by a [`ContextBuilder`] and
//! never changes afterwards. Detection heuristics live behind the trait;
//! [`MarkerContextBuilder`] is a small implementation driven by marker files.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use semver::Version;
use serde::Serialize;

use crate::error::Result;
use crate::gate::read_installed_version;
use crate::snapshot::DiskSnapshot;

/// Result of detecting a language or framework
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub present: bool,
    pub version: Option<String>,
}

impl Detection {
    pub fn present() -> Self {
        Self {
            present: true,
            version: None,
        }
    }

    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            present: true,
            version: Some(version.into()),
        }
    }
}

/// Immutable snapshot of the target project
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectContext {
    pub root: PathBuf,
    pub languages: BTreeMap<String, Detection>,
    pub frameworks: BTreeMap<String, Detection>,
    /// Tool name to the config path that revealed it
    pub tools: BTreeMap<String, String>,
    /// Installed external packages
    pub packages: BTreeSet<String>,
    /// Version recorded by the last installation, if any
    pub installed_version: Option<Version>,
}

impl ProjectContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_language(mut self, name: impl Into<String>) -> Self {
        self.languages.insert(name.into(), Detection::present());
        self
    }

    pub fn with_language_version(
        mut self,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        self.languages
            .insert(name.into(), Detection::with_version(version));
        self
    }

    pub fn with_framework(mut self, name: impl Into<String>) -> Self {
        self.frameworks.insert(name.into(), Detection::present());
        self
    }

    pub fn with_tool(mut self, name: impl Into<String>, config_path: impl Into<String>) -> Self {
        self.tools.insert(name.into(), config_path.into());
        self
    }

    pub fn with_package(mut self, name: impl Into<String>) -> Self {
        self.packages.insert(name.into());
        self
    }

    pub fn with_installed_version(mut self, version: Version) -> Self {
        self.installed_version = Some(version);
        self
    }

    pub fn has_language(&self, name: &str) -> bool {
        self.languages.get(name).is_some_and(|d| d.present)
    }

    pub fn has_framework(&self, name: &str) -> bool {
        self.frameworks.get(name).is_some_and(|d| d.present)
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn has_package(&self, name: &str) -> bool {
        self.packages.contains(name)
    }

    /// Names of detected languages, sorted.
    pub fn language_names(&self) -> Vec<&str> {
        self.languages
            .iter()
            .filter(|(_, d)| d.present)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Resolves a [`ProjectContext`] for a root directory.
///
/// Implementations must not modify the project.
pub trait ContextBuilder {
    fn build(&self, root: &Path) -> Result<ProjectContext>;
}

/// Files whose presence reveals a language
const LANGUAGE_MARKERS: &[(&str, &str)] = &[
    ("Cargo.toml", "rust"),
    ("package.json", "javascript"),
    ("tsconfig.json", "typescript"),
    ("pyproject.toml", "python"),
    ("requirements.txt", "python"),
    ("setup.py", "python"),
    ("go.mod", "go"),
];

/// Config files whose presence reveals a tool
const TOOL_MARKERS: &[(&str, &str)] = &[
    (".vscode", "vscode"),
    (".editorconfig", "editorconfig"),
    (".eslintrc.json", "eslint"),
    (".eslintrc.js", "eslint"),
    (".eslintrc", "eslint"),
    ("eslint.config.js", "eslint"),
    (".prettierrc", "prettier"),
    (".prettierrc.json", "prettier"),
    ("prettier.config.js", "prettier"),
    ("biome.json", "biome"),
    (".git", "git"),
];

/// Dependencies that identify a framework
const FRAMEWORK_PACKAGES: &[(&str, &str)] = &[
    ("react", "react"),
    ("vue", "vue"),
    ("svelte", "svelte"),
    ("next", "nextjs"),
    ("express", "express"),
    ("@angular/core", "angular"),
];

/// Builds a context from marker files in the project root.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkerContextBuilder;

impl MarkerContextBuilder {
    pub fn new() -> Self {
        Self
    }

    fn read_package_json(root: &Path, ctx: &mut ProjectContext) {
        let path = root.join("package.json");
        let Ok(content) = std::fs::read_to_string(&path) else {
            return;
        };
        let manifest: serde_json::Value = match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable package.json");
                return;
            }
        };

        for section in ["dependencies", "devDependencies"] {
            let Some(deps) = manifest.get(section).and_then(|v| v.as_object()) else {
                continue;
            };
            for (name, version) in deps {
                ctx.packages.insert(name.clone());
                let framework = FRAMEWORK_PACKAGES
                    .iter()
                    .find(|(package, _)| *package == name.as_str());
                if let Some((_, framework)) = framework {
                    let detection = match version.as_str() {
                        Some(v) => Detection::with_version(v),
                        None => Detection::present(),
                    };
                    ctx.frameworks.insert(framework.to_string(), detection);
                }
            }
        }
    }
}

impl ContextBuilder for MarkerContextBuilder {
    fn build(&self, root: &Path) -> Result<ProjectContext> {
        let mut ctx = ProjectContext::new(root);

        for (marker, language) in LANGUAGE_MARKERS {
            if root.join(marker).exists() {
                ctx.languages
                    .insert(language.to_string(), Detection::present());
            }
        }

        for (marker, tool) in TOOL_MARKERS {
            if root.join(marker).exists() && !ctx.tools.contains_key(*tool) {
                ctx.tools.insert(tool.to_string(), marker.to_string());
            }
        }

        Self::read_package_json(root, &mut ctx);
        ctx.installed_version = read_installed_version(&DiskSnapshot::new(root))?;

        tracing::debug!(
            root = %root.display(),
            languages = ?ctx.language_names(),
            tools = ctx.tools.len(),
            packages = ctx.packages.len(),
            "built project context"
        );
        Ok(ctx)
    }
}
