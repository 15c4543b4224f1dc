//! Dry-run rendering: unified diffs and one-line summaries.

use similar::TextDiff;

use crate::plan::{Action, ActionKind};

/// Lines of context around each hunk
const CONTEXT_RADIUS: usize = 3;

/// Unified diff between two versions of `path`.
///
/// Returns an empty string when both sides are equal. Content that is not
/// UTF-8 is reported as a binary change.
pub fn unified_diff(path: &str, before: &[u8], after: &[u8]) -> String {
    if before == after {
        return String::new();
    }
    let (Ok(old), Ok(new)) = (std::str::from_utf8(before), std::str::from_utf8(after)) else {
        return format!("Binary files a/{path} and b/{path} differ\n");
    };

    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(CONTEXT_RADIUS)
        .header(&format!("a/{path}"), &format!("b/{path}"))
        .to_string()
}

/// One-line description of an action.
pub fn summarize(action: &Action) -> String {
    match action.kind {
        ActionKind::Create => {
            let size = action.after.as_ref().map_or(0, Vec::len);
            format!("create {} ({size} bytes)", action.path)
        }
        ActionKind::Delete => format!("delete {} ({})", action.path, action.reason),
        kind => format!("{kind} {}: {}", action.path, action.reason),
    }
}

/// Dry-run preview: a diff for content changes, a summary otherwise.
pub fn preview(action: &Action) -> String {
    match (action.kind, &action.after) {
        (ActionKind::Update | ActionKind::Merge | ActionKind::Patch, Some(after)) => {
            let before = action.before.as_deref().unwrap_or_default();
            unified_diff(&action.path, before, after)
        }
        _ => summarize(action),
    }
}
