//! End-to-end reconciliation against real temporary directories

use pretty_assertions::assert_eq;
use semver::Version;
use serde_json::json;
use stencil_core::{
    ActionKind, Category, Error, ExecuteOptions, FileRecordStore, MergeStrategy, Mode,
    MemoryRecordStore, OutcomeStatus, Producer, ProjectContext, Reason, Reconciler, RecordStore,
    Schema, SchemaEntry, SchemaError, VersionError, parse_manifest,
};
use stencil_test_utils::TestProject;

const RUNNING: Version = Version::new(1, 0, 0);

fn reconciler(project: &TestProject, entries: Vec<SchemaEntry>) -> Reconciler {
    Reconciler::new(project.root(), Schema::new(entries).unwrap(), RUNNING).unwrap()
}

fn ctx(project: &TestProject) -> ProjectContext {
    ProjectContext::new(project.root())
}

fn apply(reconciler: &Reconciler, project: &TestProject, mode: Mode) {
    let report = reconciler
        .run(mode, &ctx(project), ExecuteOptions::default())
        .unwrap();
    assert!(report.is_success(), "failed: {:?}", report.failed_paths());
}

fn owned_and_managed() -> Vec<SchemaEntry> {
    vec![
        SchemaEntry::owned("A", Producer::text("owned A\n")),
        SchemaEntry::managed("B", Producer::text("managed B\n")),
    ]
}

#[test]
fn fresh_install_creates_owned_and_managed() {
    let project = TestProject::new();
    let reconciler = reconciler(&project, owned_and_managed());

    let plan = reconciler.plan(Mode::Install, &ctx(&project)).unwrap();
    let actions: Vec<(ActionKind, &str)> = plan
        .actions
        .iter()
        .map(|a| (a.kind, a.path.as_str()))
        .collect();
    assert_eq!(
        actions,
        vec![
            (ActionKind::Create, ".stencil/version"),
            (ActionKind::Create, "A"),
            (ActionKind::Create, "B"),
        ]
    );

    apply(&reconciler, &project, Mode::Install);
    assert_eq!(project.read("A"), "owned A\n");
    assert_eq!(project.read("B"), "managed B\n");
    assert_eq!(project.read(".stencil/version"), "1.0.0\n");

    let records = FileRecordStore::new(project.root()).load().unwrap();
    assert!(records.get("B").unwrap().matches(b"managed B\n"));
    assert!(records.get("A").is_none(), "owned files carry no record");
}

#[test]
fn second_run_is_all_skips() {
    let project = TestProject::new();
    let mut entries = owned_and_managed();
    entries.push(SchemaEntry::shared(
        "package.json",
        MergeStrategy::JsonMerge,
        Producer::text(r#"{"scripts":{"lint":"eslint ."}}"#),
    ));
    entries.push(SchemaEntry::shared(
        ".gitignore",
        MergeStrategy::TextPatch,
        Producer::text(".stencil/cache/\n"),
    ));
    let reconciler = reconciler(&project, entries);

    apply(&reconciler, &project, Mode::Install);
    let plan = reconciler.plan(Mode::Upgrade, &ctx(&project)).unwrap();
    assert!(!plan.has_changes(), "unexpected changes:\n{plan}");
    assert!(plan.actions.iter().all(|a| a.kind == ActionKind::Skip));
}

#[test]
fn json_merge_adds_fragment_and_keeps_user_scripts() {
    let project = TestProject::new().with_file("package.json", r#"{"scripts":{"build":"x"}}"#);
    let reconciler = reconciler(
        &project,
        vec![SchemaEntry::shared(
            "package.json",
            MergeStrategy::JsonMerge,
            Producer::text(r#"{"scripts":{"lint":"y"}}"#),
        )],
    );

    apply(&reconciler, &project, Mode::Install);
    let merged: serde_json::Value = serde_json::from_str(&project.read("package.json")).unwrap();
    assert_eq!(merged, json!({"scripts": {"build": "x", "lint": "y"}}));
    let rendered = project.read("package.json");
    assert!(rendered.find("build").unwrap() < rendered.find("lint").unwrap());

    let again = reconciler.plan(Mode::Upgrade, &ctx(&project)).unwrap();
    assert_eq!(again.get("package.json").unwrap().reason, Reason::UpToDate);
}

#[test]
fn uninstall_keeps_preserved_and_managed() {
    let project = TestProject::new().with_file("data/notes.md", "mine");
    let mut entries = owned_and_managed();
    entries.push(SchemaEntry::preserved("data/"));
    let reconciler = reconciler(&project, entries);
    apply(&reconciler, &project, Mode::Install);

    apply(&reconciler, &project, Mode::Uninstall);
    project.assert_file_missing("A");
    project.assert_file_missing(".stencil/version");
    project.assert_file_exists("B");
    assert_eq!(project.read("data/notes.md"), "mine");
}

#[test]
fn uninstall_full_removes_managed_and_state_but_not_preserved() {
    let project = TestProject::new().with_file("data/notes.md", "mine");
    let mut entries = owned_and_managed();
    entries.push(SchemaEntry::preserved("data/"));
    let reconciler = reconciler(&project, entries);
    apply(&reconciler, &project, Mode::Install);

    apply(&reconciler, &project, Mode::UninstallFull);
    project.assert_file_missing("A");
    project.assert_file_missing("B");
    project.assert_file_missing(".stencil");
    assert_eq!(project.read("data/notes.md"), "mine");
    assert_eq!(project.files(), vec!["data/notes.md".to_string()]);
}

#[test]
fn downgrade_is_refused_before_planning() {
    let project = TestProject::new()
        .with_installed_version("2.0.0")
        .with_file("A", "old");
    let reconciler = Reconciler::new(
        project.root(),
        Schema::new(owned_and_managed()).unwrap(),
        Version::new(1, 9, 0),
    )
    .unwrap();

    let err = reconciler
        .run(Mode::Upgrade, &ctx(&project), ExecuteOptions::default())
        .unwrap_err();
    assert!(err.is_refusal());
    assert!(matches!(
        err,
        Error::Version(VersionError::Downgrade { ref installed, .. }) if *installed == Version::new(2, 0, 0)
    ));
    assert_eq!(project.read("A"), "old");
    assert_eq!(project.read(".stencil/version"), "2.0.0\n");
}

#[test]
fn upgrade_rewrites_older_marker() {
    let project = TestProject::new().with_installed_version("0.9.0");
    let reconciler = reconciler(&project, owned_and_managed());

    let plan = reconciler.plan(Mode::Upgrade, &ctx(&project)).unwrap();
    assert_eq!(plan.get(".stencil/version").unwrap().kind, ActionKind::Update);
    apply(&reconciler, &project, Mode::Upgrade);
    assert_eq!(project.read(".stencil/version"), "1.0.0\n");
}

#[test]
fn edited_managed_file_survives_upgrade() {
    let project = TestProject::new();
    apply(&reconciler(&project, owned_and_managed()), &project, Mode::Install);
    project.write("B", "managed B\nwith my notes\n");

    let next = reconciler(
        &project,
        vec![
            SchemaEntry::owned("A", Producer::text("owned A v2\n")),
            SchemaEntry::managed("B", Producer::text("managed B v2\n")),
        ],
    );
    let plan = next.plan(Mode::Upgrade, &ctx(&project)).unwrap();
    let b = plan.get("B").unwrap();
    assert_eq!(b.kind, ActionKind::Skip);
    assert_eq!(b.reason, Reason::UserCustomized);

    apply(&next, &project, Mode::Upgrade);
    assert_eq!(project.read("A"), "owned A v2\n");
    assert_eq!(project.read("B"), "managed B\nwith my notes\n");
}

#[test]
fn unedited_managed_file_is_regenerated() {
    let project = TestProject::new();
    apply(&reconciler(&project, owned_and_managed()), &project, Mode::Install);

    let next = reconciler(
        &project,
        vec![SchemaEntry::managed("B", Producer::text("managed B v2\n"))],
    );
    apply(&next, &project, Mode::Upgrade);
    assert_eq!(project.read("B"), "managed B v2\n");

    let records = FileRecordStore::new(project.root()).load().unwrap();
    assert!(records.get("B").unwrap().matches(b"managed B v2\n"));
}

#[test]
fn hand_written_file_at_managed_path_is_not_adopted() {
    let project = TestProject::new().with_file("B", "managed B\n");
    let reconciler = reconciler(&project, owned_and_managed());

    let plan = reconciler.plan(Mode::Install, &ctx(&project)).unwrap();
    assert_eq!(plan.get("B").unwrap().reason, Reason::UnknownProvenance);
}

#[test]
fn deprecated_paths_removed_on_upgrade_only() {
    let project = TestProject::new()
        .with_file(".stencil/hooks/pre-commit", "#!/bin/sh\n")
        .with_file("legacy.json", "{}");
    let reconciler = reconciler(
        &project,
        vec![
            SchemaEntry::deprecated(".stencil/hooks/"),
            SchemaEntry::deprecated("legacy.json"),
        ],
    );

    apply(&reconciler, &project, Mode::Install);
    project.assert_file_exists("legacy.json");

    apply(&reconciler, &project, Mode::Upgrade);
    project.assert_file_missing("legacy.json");
    project.assert_file_missing(".stencil/hooks");
    project.assert_file_exists(".stencil/version");
}

#[test]
fn dropped_managed_entry_becomes_orphan_warning() {
    let project = TestProject::new();
    apply(&reconciler(&project, owned_and_managed()), &project, Mode::Install);

    let next = reconciler(
        &project,
        vec![SchemaEntry::owned("A", Producer::text("owned A\n"))],
    );
    let report = next
        .run(Mode::Upgrade, &ctx(&project), ExecuteOptions::default())
        .unwrap();
    let orphan = report.outcomes.iter().find(|o| o.path == "B").unwrap();
    assert_eq!(orphan.kind, ActionKind::Warn);
    assert_eq!(orphan.category, Category::Managed);
    project.assert_file_exists("B");
}

#[test]
fn dry_run_reports_diffs_without_writing() {
    let project = TestProject::new().with_file("package.json", "{\n  \"name\": \"app\"\n}\n");
    let reconciler = reconciler(
        &project,
        vec![SchemaEntry::shared(
            "package.json",
            MergeStrategy::JsonMerge,
            Producer::text(r#"{"private":true}"#),
        )],
    );

    let report = reconciler
        .run(Mode::Install, &ctx(&project), ExecuteOptions::dry_run())
        .unwrap();
    let merge = report.outcomes.iter().find(|o| o.path == "package.json").unwrap();
    assert_eq!(merge.status, OutcomeStatus::Planned);
    let diff = merge.preview.as_deref().unwrap();
    assert!(diff.contains("+  \"private\": true"), "diff was:\n{diff}");
    assert_eq!(project.files(), vec!["package.json".to_string()]);
}

#[test]
fn conditions_follow_context() {
    let project = TestProject::new();
    let reconciler = reconciler(
        &project,
        vec![SchemaEntry::owned("go.md", Producer::text("go\n"))
            .with_condition(stencil_core::Condition::Language("go".into()))],
    );

    let plain = reconciler.plan(Mode::Install, &ctx(&project)).unwrap();
    assert!(plain.get("go.md").is_none());

    let go = reconciler
        .plan(Mode::Install, &ctx(&project).with_language("go"))
        .unwrap();
    assert_eq!(go.get("go.md").unwrap().kind, ActionKind::Create);
}

#[test]
fn generated_producer_uses_context() {
    let project = TestProject::new();
    let reconciler = reconciler(
        &project,
        vec![SchemaEntry::managed(
            "AGENTS.md",
            Producer::generated(|ctx| {
                format!("languages: {}\n", ctx.language_names().join(", ")).into_bytes()
            }),
        )],
    );
    let report = reconciler
        .run(
            Mode::Install,
            &ctx(&project).with_language("rust").with_language("python"),
            ExecuteOptions::default(),
        )
        .unwrap();
    assert!(report.is_success());
    assert_eq!(project.read("AGENTS.md"), "languages: python, rust\n");
}

#[test]
fn schema_claiming_version_marker_is_rejected() {
    let project = TestProject::new();
    let schema = Schema::new(vec![SchemaEntry::owned(
        ".stencil/version",
        Producer::text("9.9.9\n"),
    )])
    .unwrap();
    let err = Reconciler::new(project.root(), schema, RUNNING).err().unwrap();
    assert!(err.is_refusal());
}

#[test]
fn deprecated_directory_cannot_swallow_preserved_data() {
    let project = TestProject::new().with_file("legacy/data/notes.md", "mine");
    let manifest = r#"
[[entry]]
path = "legacy/"
category = "deprecated"

[[entry]]
path = "legacy/data/"
category = "preserved"
"#;

    let err = parse_manifest(manifest, project.root()).err().unwrap();
    assert!(matches!(
        err,
        Error::Schema(SchemaError::PreservedOverlap { .. })
    ));
    assert_eq!(project.read("legacy/data/notes.md"), "mine");
}

#[test]
fn marker_stays_behind_when_records_cannot_be_saved() {
    let project = TestProject::new().with_installed_version("0.9.0");
    let reconciler = reconciler(
        &project,
        vec![SchemaEntry::managed("B", Producer::text("managed B\n"))],
    )
    .with_store(Box::new(MemoryRecordStore::failing()));

    let report = reconciler
        .run(Mode::Upgrade, &ctx(&project), ExecuteOptions::default())
        .unwrap();
    assert_eq!(report.failed_paths(), vec!["B", ".stencil/version"]);
    assert_eq!(project.read(".stencil/version"), "0.9.0\n");

    // The next upgrade still sees the old installation
    let plan = reconciler.plan(Mode::Upgrade, &ctx(&project)).unwrap();
    assert_eq!(
        plan.get(".stencil/version").unwrap().kind,
        ActionKind::Update
    );
}

#[test]
fn text_patch_fragment_carrying_markers_is_refused() {
    let project = TestProject::new().with_file(".gitignore", "target/\n");
    let reconciler = reconciler(
        &project,
        vec![SchemaEntry::shared(
            ".gitignore",
            MergeStrategy::TextPatch,
            Producer::text("a\n# stencil:end stencil\nb\n"),
        )],
    );

    let err = reconciler
        .run(Mode::Install, &ctx(&project), ExecuteOptions::default())
        .unwrap_err();
    assert!(err.is_refusal());
    assert_eq!(project.read(".gitignore"), "target/\n");
    project.assert_file_missing(".stencil/version");
}

#[test]
fn json_array_document_is_left_alone_with_warning() {
    let project = TestProject::new().with_file("cfg.json", "[1, 2]");
    let reconciler = reconciler(
        &project,
        vec![SchemaEntry::shared(
            "cfg.json",
            MergeStrategy::JsonMerge,
            Producer::text(r#"{"a": 1}"#),
        )],
    );

    let report = reconciler
        .run(Mode::Install, &ctx(&project), ExecuteOptions::default())
        .unwrap();
    let outcome = report.outcomes.iter().find(|o| o.path == "cfg.json").unwrap();
    assert_eq!(outcome.kind, ActionKind::Skip);
    assert!(matches!(outcome.reason, Reason::MergeConflict(_)));
    assert_eq!(project.read("cfg.json"), "[1, 2]");
}

#[test]
fn uninstall_full_reports_touched_paths_when_records_cannot_be_saved() {
    let project = TestProject::new();
    apply(&reconciler(&project, owned_and_managed()), &project, Mode::Install);
    let records = FileRecordStore::new(project.root()).load().unwrap();

    let report = reconciler(&project, owned_and_managed())
        .with_store(Box::new(
            MemoryRecordStore::with_index(records).with_failing_saves(),
        ))
        .run(Mode::UninstallFull, &ctx(&project), ExecuteOptions::default())
        .unwrap();
    assert_eq!(report.exit_code(), 1);
    assert!(!report.errors.is_empty());
    let applied: Vec<&str> = report
        .outcomes
        .iter()
        .filter(|o| o.status == OutcomeStatus::Applied)
        .map(|o| o.path.as_str())
        .collect();
    assert_eq!(applied, vec!["A", "B"]);
    project.assert_file_missing("B");
}

#[test]
fn owned_file_left_by_a_lapsed_condition_is_reported() {
    let project = TestProject::new();
    let go_doc = || {
        vec![SchemaEntry::owned("go.md", Producer::text("go\n"))
            .with_condition(stencil_core::Condition::Language("go".into()))]
    };
    let reconciler = reconciler(&project, go_doc());
    reconciler
        .run(
            Mode::Install,
            &ctx(&project).with_language("go"),
            ExecuteOptions::default(),
        )
        .unwrap();

    let report = reconciler
        .run(Mode::Upgrade, &ctx(&project), ExecuteOptions::default())
        .unwrap();
    let outcome = report.outcomes.iter().find(|o| o.path == "go.md").unwrap();
    assert_eq!(outcome.kind, ActionKind::Warn);
    assert_eq!(outcome.reason, Reason::Orphaned);
    project.assert_file_exists("go.md");
}
