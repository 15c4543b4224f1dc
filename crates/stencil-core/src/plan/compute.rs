//! The plan computer.
//!
//! Planning is pure: it reads the schema, context, snapshot and records and
//! returns a [`Plan`]. Nothing here writes to disk.

use std::collections::BTreeSet;

use serde_json::Value;
use stencil_blocks::{
    CommentStyle, merge_json_document, render_json, upsert_block, validate_body,
};

use super::{Action, ActionKind, Plan, Reason, compare_actions};
use crate::context::ProjectContext;
use crate::detect::{Customization, detect};
use crate::error::{Result, SchemaError};
use crate::mode::Mode;
use crate::records::RecordIndex;
use crate::schema::{Category, MergeStrategy, Schema, SchemaEntry};
use crate::snapshot::{FileState, Snapshot};

/// Compute the plan that brings the project in line with `schema`.
///
/// # Errors
///
/// Returns a [`SchemaError`] if a shared entry's producer yields a fragment
/// that cannot be merged: invalid JSON, non UTF-8 text, or text carrying
/// its own block markers.
pub fn compute_plan(
    schema: &Schema,
    mode: Mode,
    ctx: &ProjectContext,
    snapshot: &dyn Snapshot,
    records: &RecordIndex,
) -> Result<Plan> {
    let mut plan = Plan::new(mode);
    let active: Vec<&SchemaEntry> = schema.entries().iter().filter(|e| e.applies(ctx)).collect();

    for entry in &active {
        let state = snapshot.state(entry.target());
        let action = match entry.category {
            Category::Owned => plan_owned(entry, mode, ctx, state),
            Category::Managed => plan_managed(entry, mode, ctx, state, records),
            Category::Shared => plan_shared(entry, mode, ctx, state)?,
            Category::Preserved => None,
            Category::Deprecated => plan_deprecated(entry, mode, state),
        };
        if let Some(action) = action {
            tracing::debug!(
                kind = %action.kind,
                path = %action.path,
                reason = %action.reason,
                "planned action"
            );
            plan.actions.push(action);
        }
    }

    // Owned files are not recorded, so an owned entry that stopped applying
    // is found through the schema itself
    let inactive_owned = schema
        .entries()
        .iter()
        .filter(|e| e.category == Category::Owned && !e.applies(ctx));
    for entry in inactive_owned {
        let path = entry.target();
        if snapshot.state(path).exists() {
            tracing::debug!(path, "orphaned owned file");
            plan.actions.push(Action::new(
                ActionKind::Warn,
                path,
                Category::Owned,
                Reason::Orphaned,
            ));
        }
    }

    for path in records.paths() {
        if active.iter().any(|e| e.target() == path) || plan.get(path).is_some() {
            continue;
        }
        if snapshot.state(path).exists() {
            tracing::debug!(path, "orphaned managed file");
            plan.actions.push(Action::new(
                ActionKind::Warn,
                path,
                Category::Managed,
                Reason::Orphaned,
            ));
        } else {
            plan.stale_records.push(path.to_string());
        }
    }

    if !mode.is_uninstall() {
        let missing: BTreeSet<&str> = active
            .iter()
            .flat_map(|e| e.requires.iter())
            .map(String::as_str)
            .filter(|p| !ctx.has_package(p))
            .collect();
        plan.missing_packages = missing.into_iter().map(String::from).collect();
    }

    plan.actions.sort_by(compare_actions);
    Ok(plan)
}

/// Skip actions for paths whose current state rules out planning.
fn blocked(entry: &SchemaEntry, state: &FileState) -> Option<Action> {
    let reason = match state {
        FileState::Directory => Reason::PathIsDirectory,
        FileState::Unreadable(message) => Reason::Unreadable(message.clone()),
        _ => return None,
    };
    Some(Action::new(
        ActionKind::Skip,
        entry.target(),
        entry.category,
        reason,
    ))
}

fn plan_owned(
    entry: &SchemaEntry,
    mode: Mode,
    ctx: &ProjectContext,
    state: FileState,
) -> Option<Action> {
    if let Some(skip) = blocked(entry, &state) {
        return Some(skip);
    }
    let path = entry.target();

    if mode.is_uninstall() {
        return match state {
            FileState::File(current) => Some(
                Action::new(ActionKind::Delete, path, Category::Owned, Reason::Uninstall)
                    .with_before(Some(current)),
            ),
            _ => None,
        };
    }

    let desired = entry.produce(ctx)?;
    let action = match state {
        FileState::File(current) if current == desired => {
            Action::new(ActionKind::Skip, path, Category::Owned, Reason::UpToDate)
        }
        FileState::File(current) => {
            Action::new(ActionKind::Update, path, Category::Owned, Reason::ContentChanged)
                .with_before(Some(current))
                .with_after(desired)
        }
        _ => Action::new(ActionKind::Create, path, Category::Owned, Reason::Missing)
            .with_after(desired),
    };
    Some(action)
}

fn plan_managed(
    entry: &SchemaEntry,
    mode: Mode,
    ctx: &ProjectContext,
    state: FileState,
    records: &RecordIndex,
) -> Option<Action> {
    let path = entry.target();
    match mode {
        Mode::Uninstall => return None,
        Mode::UninstallFull => {
            if let Some(skip) = blocked(entry, &state) {
                return Some(skip);
            }
            return match state {
                FileState::File(current) => Some(
                    Action::new(ActionKind::Delete, path, Category::Managed, Reason::Uninstall)
                        .with_before(Some(current)),
                ),
                _ => None,
            };
        }
        Mode::Install | Mode::Upgrade => {}
    }

    if let Some(skip) = blocked(entry, &state) {
        return Some(skip);
    }
    let desired = entry.produce(ctx)?;

    let FileState::File(current) = state else {
        return Some(
            Action::new(ActionKind::Create, path, Category::Managed, Reason::Missing)
                .with_after(desired),
        );
    };

    let action = match detect(&current, records.get(path)) {
        Customization::Unedited if current == desired => {
            Action::new(ActionKind::Skip, path, Category::Managed, Reason::UpToDate)
        }
        Customization::Unedited => {
            Action::new(ActionKind::Update, path, Category::Managed, Reason::Unedited)
                .with_before(Some(current))
                .with_after(desired)
        }
        Customization::Edited => {
            Action::new(ActionKind::Skip, path, Category::Managed, Reason::UserCustomized)
        }
        Customization::UnknownProvenance => {
            Action::new(ActionKind::Skip, path, Category::Managed, Reason::UnknownProvenance)
        }
    };
    Some(action)
}

fn plan_shared(
    entry: &SchemaEntry,
    mode: Mode,
    ctx: &ProjectContext,
    state: FileState,
) -> Result<Option<Action>> {
    if mode.is_uninstall() {
        return Ok(None);
    }
    if let Some(skip) = blocked(entry, &state) {
        return Ok(Some(skip));
    }
    let Some(fragment) = entry.produce(ctx) else {
        return Ok(None);
    };

    let path = entry.target();
    let existed = state.exists();
    let before = state.content().map(<[u8]>::to_vec);

    let conflict = |detail: String| {
        Action::new(
            ActionKind::Skip,
            path,
            Category::Shared,
            Reason::MergeConflict(detail),
        )
    };

    let current = match &before {
        Some(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => return Ok(Some(conflict("existing file is not valid UTF-8".to_string()))),
        },
        None => "",
    };

    let fragment_text = String::from_utf8(fragment).map_err(|_| SchemaError::InvalidFragment {
        path: entry.path.clone(),
        reason: "fragment is not valid UTF-8".to_string(),
    })?;

    let (kind, reason, merged) = match entry.merge {
        MergeStrategy::JsonMerge => {
            let desired: Value =
                serde_json::from_str(&fragment_text).map_err(|e| SchemaError::InvalidFragment {
                    path: entry.path.clone(),
                    reason: e.to_string(),
                })?;
            let outcome = match merge_json_document(current, &desired, &entry.owned_keys) {
                Ok(outcome) => outcome,
                Err(e) => return Ok(Some(conflict(e.to_string()))),
            };
            if existed && !outcome.changed {
                return Ok(Some(Action::new(
                    ActionKind::Skip,
                    path,
                    Category::Shared,
                    Reason::UpToDate,
                )));
            }
            let rendered = render_json(&outcome.document)?;
            (ActionKind::Merge, Reason::MergeFragment, rendered)
        }
        MergeStrategy::TextPatch => {
            let style = CommentStyle::for_path(path);
            validate_body(&fragment_text, style).map_err(|e| SchemaError::InvalidFragment {
                path: entry.path.clone(),
                reason: e.to_string(),
            })?;
            let patched = match upsert_block(current, style, &entry.block, &fragment_text) {
                Ok(patched) => patched,
                Err(e) => return Ok(Some(conflict(e.to_string()))),
            };
            if existed && patched == current {
                return Ok(Some(Action::new(
                    ActionKind::Skip,
                    path,
                    Category::Shared,
                    Reason::UpToDate,
                )));
            }
            (ActionKind::Patch, Reason::PatchBlock, patched)
        }
        // Rejected by schema validation
        MergeStrategy::None => return Ok(None),
    };

    Ok(Some(
        Action::new(kind, path, Category::Shared, reason)
            .with_before(before.clone())
            .with_after(merged.into_bytes()),
    ))
}

fn plan_deprecated(entry: &SchemaEntry, mode: Mode, state: FileState) -> Option<Action> {
    if !mode.removes_deprecated() {
        return None;
    }
    let before = match state {
        FileState::Absent => return None,
        FileState::File(current) => Some(current),
        FileState::Directory | FileState::Unreadable(_) => None,
    };
    Some(
        Action::new(
            ActionKind::Delete,
            entry.target(),
            Category::Deprecated,
            Reason::Deprecated,
        )
        .with_before(before),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::records::VersionRecord;
    use crate::schema::Producer;
    use crate::snapshot::MemorySnapshot;
    use pretty_assertions::assert_eq;
    use semver::Version;

    fn ctx() -> ProjectContext {
        ProjectContext::new("/project")
    }

    fn kinds(plan: &Plan) -> Vec<(ActionKind, &str)> {
        plan.actions
            .iter()
            .map(|a| (a.kind, a.path.as_str()))
            .collect()
    }

    fn plan(schema: &Schema, mode: Mode, snapshot: &MemorySnapshot, records: &RecordIndex) -> Plan {
        compute_plan(schema, mode, &ctx(), snapshot, records).unwrap()
    }

    #[test]
    fn owned_entry_lifecycle() {
        let schema = Schema::new(vec![SchemaEntry::owned("A", Producer::text("a"))]).unwrap();
        let records = RecordIndex::new();

        let empty = MemorySnapshot::new();
        assert_eq!(
            kinds(&plan(&schema, Mode::Install, &empty, &records)),
            vec![(ActionKind::Create, "A")]
        );

        let stale = MemorySnapshot::new().with_file("A", "old");
        let update = plan(&schema, Mode::Upgrade, &stale, &records);
        assert_eq!(kinds(&update), vec![(ActionKind::Update, "A")]);
        assert_eq!(update.actions[0].before.as_deref(), Some(b"old".as_slice()));
        assert_eq!(update.actions[0].after.as_deref(), Some(b"a".as_slice()));

        let current = MemorySnapshot::new().with_file("A", "a");
        let skip = plan(&schema, Mode::Upgrade, &current, &records);
        assert_eq!(skip.actions[0].reason, Reason::UpToDate);

        for mode in [Mode::Uninstall, Mode::UninstallFull] {
            assert_eq!(
                kinds(&plan(&schema, mode, &current, &records)),
                vec![(ActionKind::Delete, "A")]
            );
        }
    }

    #[test]
    fn managed_entry_respects_customization() {
        let schema =
            Schema::new(vec![SchemaEntry::managed("B", Producer::text("v2"))]).unwrap();
        let mut records = RecordIndex::new();
        records.insert("B", VersionRecord::new(b"v1", &Version::new(1, 0, 0)));

        let unedited = MemorySnapshot::new().with_file("B", "v1");
        let update = plan(&schema, Mode::Upgrade, &unedited, &records);
        assert_eq!(update.actions[0].kind, ActionKind::Update);
        assert_eq!(update.actions[0].reason, Reason::Unedited);

        let edited = MemorySnapshot::new().with_file("B", "v1 plus my notes");
        let skip = plan(&schema, Mode::Upgrade, &edited, &records);
        assert_eq!(skip.actions[0].kind, ActionKind::Skip);
        assert_eq!(skip.actions[0].reason, Reason::UserCustomized);

        let unknown = plan(&schema, Mode::Upgrade, &unedited, &RecordIndex::new());
        assert_eq!(unknown.actions[0].reason, Reason::UnknownProvenance);
    }

    #[test]
    fn managed_entry_removed_only_by_full_uninstall() {
        let schema = Schema::new(vec![SchemaEntry::managed("B", Producer::text("b"))]).unwrap();
        let snapshot = MemorySnapshot::new().with_file("B", "b");
        let records = RecordIndex::new();

        assert!(plan(&schema, Mode::Uninstall, &snapshot, &records).actions.is_empty());
        assert_eq!(
            kinds(&plan(&schema, Mode::UninstallFull, &snapshot, &records)),
            vec![(ActionKind::Delete, "B")]
        );
    }

    #[test]
    fn json_merge_keeps_user_values() {
        let schema = Schema::new(vec![SchemaEntry::shared(
            "package.json",
            MergeStrategy::JsonMerge,
            Producer::text(r#"{"scripts":{"lint":"y","build":"tool"}}"#),
        )])
        .unwrap();
        let snapshot =
            MemorySnapshot::new().with_file("package.json", r#"{"scripts":{"build":"x"}}"#);

        let plan = plan(&schema, Mode::Install, &snapshot, &RecordIndex::new());
        let action = &plan.actions[0];
        assert_eq!(action.kind, ActionKind::Merge);
        let merged: Value = serde_json::from_slice(action.after.as_deref().unwrap()).unwrap();
        assert_eq!(merged, serde_json::json!({"scripts": {"build": "x", "lint": "y"}}));
    }

    #[test]
    fn unparseable_shared_file_is_a_conflict() {
        let schema = Schema::new(vec![SchemaEntry::shared(
            "settings.json",
            MergeStrategy::JsonMerge,
            Producer::text("{}"),
        )])
        .unwrap();
        let snapshot = MemorySnapshot::new().with_file("settings.json", "{ broken");

        let plan = plan(&schema, Mode::Upgrade, &snapshot, &RecordIndex::new());
        assert_eq!(plan.actions[0].kind, ActionKind::Skip);
        assert!(matches!(plan.actions[0].reason, Reason::MergeConflict(_)));
        assert_eq!(plan.warnings().count(), 1);
    }

    #[test]
    fn invalid_json_fragment_is_a_schema_error() {
        let schema = Schema::new(vec![SchemaEntry::shared(
            "a.json",
            MergeStrategy::JsonMerge,
            Producer::text("not json"),
        )])
        .unwrap();
        let err = compute_plan(&schema, Mode::Install, &ctx(), &MemorySnapshot::new(), &RecordIndex::new())
            .unwrap_err();
        assert!(err.is_refusal());
    }

    #[test]
    fn non_object_json_root_is_a_conflict() {
        let schema = Schema::new(vec![SchemaEntry::shared(
            "cfg.json",
            MergeStrategy::JsonMerge,
            Producer::text(r#"{"a": 1}"#),
        )])
        .unwrap();
        let snapshot = MemorySnapshot::new().with_file("cfg.json", "[1, 2]");

        let plan = plan(&schema, Mode::Install, &snapshot, &RecordIndex::new());
        assert_eq!(plan.actions[0].kind, ActionKind::Skip);
        match &plan.actions[0].reason {
            Reason::MergeConflict(detail) => assert!(detail.contains("array"), "{detail}"),
            other => panic!("unexpected reason {other}"),
        }
    }

    #[test]
    fn text_patch_fragment_with_markers_is_a_schema_error() {
        let schema = Schema::new(vec![SchemaEntry::shared(
            ".gitignore",
            MergeStrategy::TextPatch,
            Producer::text("a\n# stencil:end stencil\nb\n"),
        )])
        .unwrap();
        let err = compute_plan(&schema, Mode::Install, &ctx(), &MemorySnapshot::new(), &RecordIndex::new())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Schema(SchemaError::InvalidFragment { .. })
        ));
    }

    #[test]
    fn text_patch_appends_then_settles() {
        let schema = Schema::new(vec![SchemaEntry::shared(
            ".gitignore",
            MergeStrategy::TextPatch,
            Producer::text(".stencil/cache/\n"),
        )])
        .unwrap();
        let snapshot = MemorySnapshot::new().with_file(".gitignore", "target/\n");
        let first = plan(&schema, Mode::Install, &snapshot, &RecordIndex::new());
        let patched = first.actions[0].after.clone().unwrap();
        assert_eq!(
            String::from_utf8(patched.clone()).unwrap(),
            "target/\n\n# stencil:begin stencil\n.stencil/cache/\n# stencil:end stencil\n"
        );

        let settled = MemorySnapshot::new().with_file(".gitignore", patched);
        let second = plan(&schema, Mode::Upgrade, &settled, &RecordIndex::new());
        assert_eq!(second.actions[0].reason, Reason::UpToDate);
    }

    #[test]
    fn shared_entries_untouched_on_uninstall() {
        let schema = Schema::new(vec![SchemaEntry::shared(
            ".gitignore",
            MergeStrategy::TextPatch,
            Producer::text("x"),
        )])
        .unwrap();
        let snapshot = MemorySnapshot::new().with_file(".gitignore", "x");
        for mode in [Mode::Uninstall, Mode::UninstallFull] {
            assert!(plan(&schema, mode, &snapshot, &RecordIndex::new()).actions.is_empty());
        }
    }

    #[test]
    fn deprecated_entries_removed_outside_install() {
        let schema = Schema::new(vec![SchemaEntry::deprecated("old/")]).unwrap();
        let snapshot = MemorySnapshot::new().with_file("old/hook.sh", "#!/bin/sh");

        assert!(plan(&schema, Mode::Install, &snapshot, &RecordIndex::new()).actions.is_empty());
        for mode in [Mode::Upgrade, Mode::Uninstall, Mode::UninstallFull] {
            assert_eq!(
                kinds(&plan(&schema, mode, &snapshot, &RecordIndex::new())),
                vec![(ActionKind::Delete, "old")]
            );
        }
    }

    #[test]
    fn preserved_paths_never_planned() {
        let schema = Schema::new(vec![
            SchemaEntry::preserved("data/"),
            SchemaEntry::owned("A", Producer::text("a")),
        ])
        .unwrap();
        let snapshot = MemorySnapshot::new().with_file("data/x", "x");
        for mode in Mode::ALL {
            let plan = plan(&schema, mode, &snapshot, &RecordIndex::new());
            assert!(plan.actions.iter().all(|a| !a.path.starts_with("data")));
        }
    }

    #[test]
    fn directory_in_place_of_file_is_skipped() {
        let schema = Schema::new(vec![SchemaEntry::owned("A", Producer::text("a"))]).unwrap();
        let snapshot = MemorySnapshot::new().with_dir("A");
        let plan = plan(&schema, Mode::Install, &snapshot, &RecordIndex::new());
        assert_eq!(plan.actions[0].kind, ActionKind::Skip);
        assert_eq!(plan.actions[0].reason, Reason::PathIsDirectory);
    }

    #[test]
    fn orphans_warn_and_stale_records_are_collected() {
        let schema = Schema::new(vec![SchemaEntry::managed("kept", Producer::text("k"))]).unwrap();
        let mut records = RecordIndex::new();
        let v = Version::new(1, 0, 0);
        records.insert("kept", VersionRecord::new(b"k", &v));
        records.insert("orphan.md", VersionRecord::new(b"o", &v));
        records.insert("gone.md", VersionRecord::new(b"g", &v));
        let snapshot = MemorySnapshot::new()
            .with_file("kept", "k")
            .with_file("orphan.md", "o");

        let plan = plan(&schema, Mode::Upgrade, &snapshot, &records);
        let orphan = plan.get("orphan.md").unwrap();
        assert_eq!(orphan.kind, ActionKind::Warn);
        assert_eq!(orphan.reason, Reason::Orphaned);
        assert_eq!(plan.stale_records, vec!["gone.md".to_string()]);
        assert!(!plan.has_changes());
    }

    #[test]
    fn false_conditions_emit_nothing() {
        let schema = Schema::new(vec![
            SchemaEntry::owned("go.tool", Producer::text("x"))
                .with_condition(crate::schema::Condition::Language("go".into())),
        ])
        .unwrap();
        assert!(plan(&schema, Mode::Install, &MemorySnapshot::new(), &RecordIndex::new())
            .actions
            .is_empty());
    }

    #[test]
    fn owned_file_outliving_its_condition_warns() {
        let schema = Schema::new(vec![
            SchemaEntry::owned("go.tool", Producer::text("x"))
                .with_condition(crate::schema::Condition::Language("go".into())),
        ])
        .unwrap();
        let snapshot = MemorySnapshot::new().with_file("go.tool", "x");

        for mode in Mode::ALL {
            let plan = plan(&schema, mode, &snapshot, &RecordIndex::new());
            let warning = plan.get("go.tool").unwrap();
            assert_eq!(warning.kind, ActionKind::Warn);
            assert_eq!(warning.category, Category::Owned);
            assert_eq!(warning.reason, Reason::Orphaned);
        }
    }

    #[test]
    fn missing_packages_are_reported_once() {
        let schema = Schema::new(vec![
            SchemaEntry::owned("a", Producer::text("a")).with_requires(["eslint", "prettier"]),
            SchemaEntry::owned("b", Producer::text("b")).with_requires(["eslint"]),
        ])
        .unwrap();
        let ctx = ctx().with_package("prettier");
        let plan = compute_plan(&schema, Mode::Install, &ctx, &MemorySnapshot::new(), &RecordIndex::new())
            .unwrap();
        assert_eq!(plan.missing_packages, vec!["eslint".to_string()]);

        let uninstall =
            compute_plan(&schema, Mode::Uninstall, &ctx, &MemorySnapshot::new(), &RecordIndex::new())
                .unwrap();
        assert!(uninstall.missing_packages.is_empty());
    }

    #[test]
    fn planning_is_deterministic() {
        let schema = Schema::new(vec![
            SchemaEntry::managed("m", Producer::text("m")),
            SchemaEntry::owned("o", Producer::text("o")),
            SchemaEntry::deprecated("d"),
        ])
        .unwrap();
        let snapshot = MemorySnapshot::new().with_file("d", "d");
        let first = plan(&schema, Mode::Upgrade, &snapshot, &RecordIndex::new());
        let second = plan(&schema, Mode::Upgrade, &snapshot, &RecordIndex::new());
        assert_eq!(first, second);
        assert_eq!(
            kinds(&first),
            vec![
                (ActionKind::Delete, "d"),
                (ActionKind::Create, "o"),
                (ActionKind::Create, "m"),
            ]
        );
    }
}
