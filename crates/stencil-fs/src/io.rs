//! Atomic I/O operations with file locking

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename strategy to prevent partial writes.
/// The temp file lives in the target's directory so the rename never
/// crosses filesystems.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .lock_exclusive()
        .map_err(|_| Error::LockFailed {
            path: native_path.clone(),
        })?;

    let written = temp_file
        .write_all(content)
        .and_then(|()| temp_file.sync_all());
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(&temp_path, e));
    }

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    if let Err(e) = fs::rename(&temp_path, &native_path) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(&native_path, e));
    }

    tracing::debug!(path = %path, bytes = content.len(), "atomic write");
    Ok(())
}

/// Remove a file or a whole directory tree.
///
/// Returns `false` if nothing existed at `path`. Symlinks are removed
/// themselves, never followed.
pub fn remove_path(path: &NormalizedPath) -> Result<bool> {
    let native_path = path.to_native();
    let metadata = match fs::symlink_metadata(&native_path) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(Error::io(&native_path, e)),
    };

    let removed = if metadata.is_dir() {
        fs::remove_dir_all(&native_path)
    } else {
        fs::remove_file(&native_path)
    };
    removed.map_err(|e| Error::io(&native_path, e))?;

    tracing::debug!(path = %path, "removed");
    Ok(true)
}

/// Remove empty ancestor directories of `path`, stopping at `root`.
///
/// `root` itself is never removed. Stops at the first non-empty directory.
pub fn prune_empty_parents(path: &NormalizedPath, root: &Path) -> Result<()> {
    let native_path = path.to_native();
    if !native_path.starts_with(root) {
        return Err(Error::OutsideRoot { path: native_path });
    }

    let mut current = native_path.parent();
    while let Some(dir) = current {
        if dir == root || !dir.starts_with(root) {
            break;
        }
        match fs::remove_dir(dir) {
            Ok(()) => tracing::debug!(dir = %dir.display(), "pruned empty directory"),
            Err(_) => break,
        }
        current = dir.parent();
    }
    Ok(())
}
