//! JSON deep-merge of a desired fragment into a user document.
//!
//! Merge rules:
//! - objects merge key by key; missing keys are inserted in fragment order
//! - scalars and type mismatches keep the existing value
//! - arrays gain the desired elements they do not already contain
//! - keys listed as tool-owned (RFC 6901 pointers) take the desired value
//!
//! The merge is idempotent: merging the same fragment twice changes nothing
//! the second time.

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Maximum recursion depth; deeper subtrees are left to the existing value.
const MAX_MERGE_DEPTH: usize = 128;

/// Result of merging a fragment into a document.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// The merged document
    pub document: Value,
    /// Whether the merge changed anything
    pub changed: bool,
}

/// Merge `desired` into `existing` in place.
///
/// Returns `true` if `existing` was modified.
///
/// # Example
/// ```
/// use serde_json::json;
/// use stencil_blocks::merge_json;
///
/// let mut doc = json!({"scripts": {"build": "x"}});
/// assert!(merge_json(&mut doc, &json!({"scripts": {"lint": "y"}}), &[]));
/// assert_eq!(doc, json!({"scripts": {"build": "x", "lint": "y"}}));
/// assert!(!merge_json(&mut doc, &json!({"scripts": {"lint": "y"}}), &[]));
/// ```
pub fn merge_json(existing: &mut Value, desired: &Value, owned_keys: &[String]) -> bool {
    let mut pointer = String::new();
    merge_at(existing, desired, &mut pointer, owned_keys, 0)
}

fn merge_at(
    existing: &mut Value,
    desired: &Value,
    pointer: &mut String,
    owned_keys: &[String],
    depth: usize,
) -> bool {
    if owned_keys.iter().any(|key| key == pointer) {
        if *existing == *desired {
            return false;
        }
        *existing = desired.clone();
        return true;
    }

    if depth > MAX_MERGE_DEPTH {
        tracing::warn!(pointer = %pointer, "merge depth limit reached, keeping existing value");
        return false;
    }

    match (existing, desired) {
        (Value::Object(existing_obj), Value::Object(desired_obj)) => {
            let mut changed = false;
            for (key, desired_value) in desired_obj {
                let mark = pointer.len();
                pointer.push('/');
                pointer.push_str(&escape_pointer_token(key));

                match existing_obj.get_mut(key) {
                    Some(existing_value) => {
                        changed |=
                            merge_at(existing_value, desired_value, pointer, owned_keys, depth + 1);
                    }
                    None => {
                        existing_obj.insert(key.clone(), desired_value.clone());
                        changed = true;
                    }
                }

                pointer.truncate(mark);
            }
            changed
        }
        (Value::Array(existing_items), Value::Array(desired_items)) => {
            let mut changed = false;
            for item in desired_items {
                if !existing_items.contains(item) {
                    existing_items.push(item.clone());
                    changed = true;
                }
            }
            changed
        }
        // Existing user value wins for scalars and mismatched types
        _ => false,
    }
}

/// Escape a key for use as a JSON pointer reference token.
fn escape_pointer_token(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

/// Parse a document, treating blank content as an empty object.
///
/// # Errors
///
/// Returns `Error::Json` if the content is not valid JSON.
pub fn parse_document(content: &str) -> Result<Value> {
    if content.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    Ok(serde_json::from_str(content)?)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse `content`, merge `desired` into it and report the outcome.
///
/// # Errors
///
/// Returns `Error::Json` if the content is not valid JSON, and
/// `Error::RootMismatch` if the document root and the fragment root are of
/// different types.
pub fn merge_json_document(
    content: &str,
    desired: &Value,
    owned_keys: &[String],
) -> Result<MergeOutcome> {
    let mut document = parse_document(content)?;
    let (existing, wanted) = (type_name(&document), type_name(desired));
    if existing != wanted {
        return Err(Error::RootMismatch {
            existing,
            desired: wanted,
        });
    }
    let changed = merge_json(&mut document, desired, owned_keys);
    Ok(MergeOutcome { document, changed })
}

/// Render a document as pretty JSON with a trailing newline.
pub fn render_json(document: &Value) -> Result<String> {
    let mut rendered = serde_json::to_string_pretty(document)?;
    rendered.push('\n');
    Ok(rendered)
}
