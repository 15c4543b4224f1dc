//! Planned actions and their total order.

use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::schema::Category;

/// What the executor will do to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Create,
    Update,
    Skip,
    Merge,
    Patch,
    Delete,
    Warn,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Skip => "skip",
            Self::Merge => "merge",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::Warn => "warn",
        }
    }

    /// Whether applying this action touches the filesystem.
    pub fn is_mutation(self) -> bool {
        !matches!(self, Self::Skip | Self::Warn)
    }

    /// Whether this action writes content.
    pub fn is_write(self) -> bool {
        matches!(self, Self::Create | Self::Update | Self::Merge | Self::Patch)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Why an action was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    /// The file does not exist yet
    Missing,
    /// Owned content differs from what the producer yields
    ContentChanged,
    /// Managed file is unedited and its generated content changed
    Unedited,
    UpToDate,
    UserCustomized,
    /// Managed file exists but was never recorded
    UnknownProvenance,
    MergeFragment,
    PatchBlock,
    Deprecated,
    Uninstall,
    /// Recorded managed file no longer produced by any entry
    Orphaned,
    /// Existing content could not be merged
    MergeConflict(String),
    PathIsDirectory,
    Unreadable(String),
}

impl Reason {
    /// Whether the reason should be surfaced to the user as a warning.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::Orphaned | Self::MergeConflict(_) | Self::PathIsDirectory | Self::Unreadable(_)
        )
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("missing"),
            Self::ContentChanged => f.write_str("content-changed"),
            Self::Unedited => f.write_str("unedited"),
            Self::UpToDate => f.write_str("up-to-date"),
            Self::UserCustomized => f.write_str("user-customized"),
            Self::UnknownProvenance => f.write_str("unknown-provenance"),
            Self::MergeFragment => f.write_str("merge-fragment"),
            Self::PatchBlock => f.write_str("patch-block"),
            Self::Deprecated => f.write_str("deprecated"),
            Self::Uninstall => f.write_str("uninstall"),
            Self::Orphaned => f.write_str("orphaned"),
            Self::MergeConflict(detail) => write!(f, "merge-conflict: {detail}"),
            Self::PathIsDirectory => f.write_str("path-is-directory"),
            Self::Unreadable(detail) => write!(f, "unreadable: {detail}"),
        }
    }
}

impl Serialize for Reason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One step of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub kind: ActionKind,
    pub path: String,
    pub category: Category,
    pub reason: Reason,
    /// Current content, when the action replaces or removes a file
    #[serde(skip)]
    pub before: Option<Vec<u8>>,
    /// Content the action will write
    #[serde(skip)]
    pub after: Option<Vec<u8>>,
}

impl Action {
    pub fn new(kind: ActionKind, path: impl Into<String>, category: Category, reason: Reason) -> Self {
        Self {
            kind,
            path: path.into(),
            category,
            reason,
            before: None,
            after: None,
        }
    }

    pub fn with_before(mut self, before: Option<Vec<u8>>) -> Self {
        self.before = before;
        self
    }

    pub fn with_after(mut self, after: Vec<u8>) -> Self {
        self.after = Some(after);
        self
    }

    /// Ordering bucket:
    /// deprecated deletes, owned, managed, shared, then warnings.
    pub fn priority(&self) -> u8 {
        if self.kind == ActionKind::Warn || self.reason.is_warning() {
            return 4;
        }
        match self.category {
            Category::Deprecated => 0,
            Category::Owned => 1,
            Category::Managed => 2,
            Category::Shared => 3,
            Category::Preserved => 4,
        }
    }
}

/// Total order over actions: priority, then path, then kind.
pub fn compare_actions(a: &Action, b: &Action) -> Ordering {
    a.priority()
        .cmp(&b.priority())
        .then_with(|| a.path.cmp(&b.path))
        .then_with(|| a.kind.cmp(&b.kind))
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<6} {} [{}] {}",
            self.kind, self.path, self.category, self.reason
        )
    }
}
