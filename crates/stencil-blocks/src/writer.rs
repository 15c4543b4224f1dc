//! Block writing for marker-delimited regions.
//!
//! Provides functions to insert, update and upsert keyed blocks in text
//! content. Text outside the markers is preserved byte for byte.

use crate::error::{Error, Result};
use crate::parser::{find_block, validate_body, validate_key};
use crate::style::CommentStyle;

/// Block bodies always end with a newline so the closing marker sits on
/// its own line.
fn normalize_body(block_content: &str) -> String {
    if block_content.is_empty() || block_content.ends_with('\n') {
        block_content.to_string()
    } else {
        format!("{block_content}\n")
    }
}

/// Creates a complete block with markers and content.
fn format_block(style: CommentStyle, key: &str, block_content: &str) -> String {
    format!(
        "{}\n{}{}\n",
        style.begin_marker(key),
        normalize_body(block_content),
        style.end_marker(key)
    )
}

/// Inserts a new block at the end of the content.
///
/// An empty document becomes just the block; otherwise the block is
/// appended after a blank line.
///
/// # Example
/// ```
/// use stencil_blocks::{CommentStyle, insert_block};
///
/// let result = insert_block("node_modules/\n", CommentStyle::Hash, "stencil", ".stencil/cache/").unwrap();
/// assert_eq!(
///     result,
///     "node_modules/\n\n# stencil:begin stencil\n.stencil/cache/\n# stencil:end stencil\n"
/// );
/// ```
pub fn insert_block(
    content: &str,
    style: CommentStyle,
    key: &str,
    block_content: &str,
) -> Result<String> {
    validate_key(key)?;
    validate_body(block_content, style)?;
    let block = format_block(style, key, block_content);

    if content.is_empty() {
        Ok(block)
    } else if content.ends_with('\n') {
        Ok(format!("{content}\n{block}"))
    } else {
        Ok(format!("{content}\n\n{block}"))
    }
}

/// Replaces the content of an existing block.
///
/// # Errors
/// Returns `Error::BlockNotFound` if no block with the given key exists,
/// or `Error::MarkerInBody` if `new_content` contains a marker line.
pub fn update_block(
    content: &str,
    style: CommentStyle,
    key: &str,
    new_content: &str,
) -> Result<String> {
    validate_key(key)?;
    validate_body(new_content, style)?;
    let block = find_block(content, style, key)?.ok_or_else(|| Error::BlockNotFound {
        key: key.to_string(),
    })?;

    let mut result = String::with_capacity(content.len() + new_content.len());
    result.push_str(&content[..block.body.start]);
    result.push_str(&normalize_body(new_content));
    result.push_str(&content[block.body.end..]);
    Ok(result)
}

/// Inserts a new block or updates an existing one.
///
/// Re-applying the same content yields byte-identical output.
///
/// # Example
/// ```
/// use stencil_blocks::{CommentStyle, upsert_block};
///
/// let once = upsert_block("", CommentStyle::Html, "intro", "Hello").unwrap();
/// let twice = upsert_block(&once, CommentStyle::Html, "intro", "Hello").unwrap();
/// assert_eq!(once, twice);
/// ```
pub fn upsert_block(
    content: &str,
    style: CommentStyle,
    key: &str,
    block_content: &str,
) -> Result<String> {
    match find_block(content, style, key)? {
        Some(_) => update_block(content, style, key, block_content),
        None => insert_block(content, style, key, block_content),
    }
}
