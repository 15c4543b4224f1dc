//! Content checksums in the `sha256:<hex>` form stored in version records

use sha2::{Digest, Sha256};

const ALGORITHM: &str = "sha256";

/// Checksum of `content` as `sha256:<lowercase hex>`.
pub fn content_checksum(content: &[u8]) -> String {
    format!("{ALGORITHM}:{:x}", Sha256::digest(content))
}

/// Whether `content` hashes to `expected`.
///
/// A checksum tagged with another algorithm never matches.
pub fn checksum_matches(content: &[u8], expected: &str) -> bool {
    match expected.split_once(':') {
        Some((ALGORITHM, _)) => content_checksum(content) == expected,
        _ => false,
    }
}
