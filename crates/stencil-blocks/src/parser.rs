//! Block parsing for marker-delimited regions.
//!
//! Parses keyed blocks in text files with the format:
//! ```text
//! # stencil:begin KEY
//! content here
//! # stencil:end KEY
//! ```
//!
//! Markers are matched per line, so text that merely mentions a marker
//! inside a longer line is ignored.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::style::CommentStyle;

/// A parsed block with its key, content, and position information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// The key identifying this block.
    pub key: String,
    /// The content between the markers, without the markers themselves.
    pub content: String,
    /// The 1-based line number of the opening marker.
    pub start_line: usize,
    /// The 1-based line number of the closing marker.
    pub end_line: usize,
    /// Byte range of the content between the markers.
    pub(crate) body: Range<usize>,
}

static KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("Invalid block key regex"));

/// Check that `key` can be embedded in a marker line.
pub fn validate_key(key: &str) -> Result<()> {
    if KEY_REGEX.is_match(key) {
        Ok(())
    } else {
        Err(Error::InvalidKey {
            key: key.to_string(),
        })
    }
}

/// Check that no line of `body` would be read back as a marker.
///
/// # Errors
///
/// Returns `Error::MarkerInBody` naming the first offending 1-based line.
pub fn validate_body(body: &str, style: CommentStyle) -> Result<()> {
    match body.lines().position(|line| style.parse_marker(line).is_some()) {
        Some(idx) => Err(Error::MarkerInBody { line: idx + 1 }),
        None => Ok(()),
    }
}

/// Parses all blocks from the given content, in order of appearance.
///
/// # Errors
///
/// Returns `Error::UnterminatedBlock` if an opening marker has no matching
/// closing marker.
///
/// # Example
/// ```
/// use stencil_blocks::{CommentStyle, parse_blocks};
///
/// let content = "user line\n# stencil:begin tools\nmanaged\n# stencil:end tools\n";
/// let blocks = parse_blocks(content, CommentStyle::Hash).unwrap();
/// assert_eq!(blocks.len(), 1);
/// assert_eq!(blocks[0].key, "tools");
/// assert_eq!(blocks[0].content, "managed\n");
/// ```
pub fn parse_blocks(content: &str, style: CommentStyle) -> Result<Vec<Block>> {
    let mut blocks = Vec::new();
    // (key, begin line number, body start offset)
    let mut open: Option<(String, usize, usize)> = None;
    let mut offset = 0;

    for (idx, line) in content.split_inclusive('\n').enumerate() {
        let line_start = offset;
        offset += line.len();

        let Some((is_begin, key)) = style.parse_marker(line) else {
            continue;
        };

        match (&open, is_begin) {
            (None, true) => open = Some((key.to_string(), idx + 1, offset)),
            (Some((open_key, start_line, body_start)), false) if open_key == key => {
                blocks.push(Block {
                    key: open_key.clone(),
                    content: content[*body_start..line_start].to_string(),
                    start_line: *start_line,
                    end_line: idx + 1,
                    body: *body_start..line_start,
                });
                open = None;
            }
            // Nested or mismatched markers are treated as plain text
            _ => {}
        }
    }

    if let Some((key, line, _)) = open {
        return Err(Error::UnterminatedBlock { key, line });
    }

    Ok(blocks)
}

/// Finds a specific block by its key.
///
/// # Example
/// ```
/// use stencil_blocks::{CommentStyle, find_block};
///
/// let content = "<!-- stencil:begin intro -->\nHello\n<!-- stencil:end intro -->\n";
/// let block = find_block(content, CommentStyle::Html, "intro").unwrap();
/// assert_eq!(block.unwrap().content, "Hello\n");
/// ```
pub fn find_block(content: &str, style: CommentStyle, key: &str) -> Result<Option<Block>> {
    Ok(parse_blocks(content, style)?
        .into_iter()
        .find(|block| block.key == key))
}
