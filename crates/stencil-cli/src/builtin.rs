//! The schema used when no manifest is given

use stencil_core::{
    Condition, MergeStrategy, Producer, ProjectContext, Schema, SchemaEntry, SchemaError,
};

const STATE_README: &str = "\
# .stencil

This directory is maintained by stencil. Files here are regenerated on
every run; put your own data under `.stencil/data/`, which stencil never
touches.
";

const EDITORCONFIG: &str = "\
root = true

[*]
end_of_line = lf
insert_final_newline = true
trim_trailing_whitespace = true
indent_style = space
indent_size = 4

[*.{json,yml,yaml,md}]
indent_size = 2
";

const GITIGNORE_BLOCK: &str = ".stencil/cache/\n";

const VSCODE_SETTINGS: &str = r#"{
  "files.exclude": {
    ".stencil/cache": true
  }
}"#;

const PACKAGE_SCRIPTS: &str = r#"{
  "scripts": {
    "lint": "eslint ."
  }
}"#;

fn agents_md(ctx: &ProjectContext) -> Vec<u8> {
    let mut out = String::from("# Agent guidelines\n\n");
    out.push_str("Generated by stencil. Once you edit this file stencil leaves it alone.\n");

    let languages = ctx.language_names();
    if !languages.is_empty() {
        out.push_str("\n## Languages\n\n");
        for language in languages {
            out.push_str(&format!("- {language}\n"));
        }
    }
    if !ctx.frameworks.is_empty() {
        out.push_str("\n## Frameworks\n\n");
        for (name, detection) in &ctx.frameworks {
            match &detection.version {
                Some(version) => out.push_str(&format!("- {name} {version}\n")),
                None => out.push_str(&format!("- {name}\n")),
            }
        }
    }
    out.into_bytes()
}

/// Build the built-in schema.
pub fn builtin_schema() -> Result<Schema, SchemaError> {
    Schema::new(vec![
        SchemaEntry::owned(".stencil/README.md", Producer::text(STATE_README)),
        SchemaEntry::managed("AGENTS.md", Producer::generated(agents_md)),
        SchemaEntry::managed(".editorconfig", Producer::text(EDITORCONFIG)),
        SchemaEntry::shared(
            ".gitignore",
            MergeStrategy::TextPatch,
            Producer::text(GITIGNORE_BLOCK),
        ),
        SchemaEntry::shared(
            ".vscode/settings.json",
            MergeStrategy::JsonMerge,
            Producer::text(VSCODE_SETTINGS),
        )
        .with_condition(Condition::Tool("vscode".into())),
        SchemaEntry::shared(
            "package.json",
            MergeStrategy::JsonMerge,
            Producer::text(PACKAGE_SCRIPTS),
        )
        .with_condition(Condition::Language("javascript".into()))
        .with_requires(["eslint"]),
        SchemaEntry::preserved(".stencil/data/"),
        SchemaEntry::deprecated(".stencil/legacy.json"),
        SchemaEntry::deprecated(".stencil/hooks/"),
    ])
}
