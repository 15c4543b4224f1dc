//! Filesystem primitives for Stencil
//!
//! Provides normalized project-relative paths, atomic writes, checksums and
//! the layout of the persisted state directory.

pub mod checksum;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;

pub use checksum::{checksum_matches, content_checksum};
pub use constants::StatePath;
pub use error::{Error, Result};
pub use path::{NormalizedPath, is_within, validate_relative_path};
