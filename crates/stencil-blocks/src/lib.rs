//! Merge strategies for files Stencil shares with the user.
//!
//! Two strategies are provided:
//!
//! ## Text patch (`parser` + `writer`)
//!
//! Tool content lives between a pair of comment markers keyed by a block
//! name. Everything outside the markers belongs to the user and is never
//! touched:
//!
//! ```text
//! # stencil:begin stencil
//! .stencil/cache/
//! # stencil:end stencil
//! ```
//!
//! The comment syntax is picked from the file extension, see [`CommentStyle`].
//!
//! ## JSON deep-merge (`merge`)
//!
//! A desired fragment is merged into an existing document. Existing user
//! values win on conflict unless the key is declared tool-owned; arrays are
//! extended with missing elements only.

pub mod error;
pub mod merge;
pub mod parser;
pub mod style;
pub mod writer;

pub use error::{Error, Result};
pub use merge::{MergeOutcome, merge_json, merge_json_document, parse_document, render_json};
pub use parser::{Block, find_block, parse_blocks, validate_body};
pub use style::CommentStyle;
pub use writer::{insert_block, update_block, upsert_block};
