//! Atomic whole-file replacement.
//!
//! Data is written to a hidden temporary file next to the target, fsync'd,
//! then renamed over the target. Readers either see the old file or the
//! complete new one.

use chatterboxer_core::{ChatterError, error::Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Replaces `path` with whatever `write` produces.
///
/// `write` receives the freshly created temporary file and must hand it back
/// once all bytes are written so it can be synced. On any failure the
/// temporary file is removed and `path` is left as it was.
pub fn atomic_write<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(File) -> Result<File>,
{
    let tmp_path = temp_path(path)?;

    let outcome = File::create(&tmp_path)
        .map_err(ChatterError::from)
        .and_then(write)
        .and_then(|file| file.sync_all().map_err(ChatterError::from))
        .and_then(|()| fs::rename(&tmp_path, path).map_err(ChatterError::from));

    if outcome.is_err() {
        // Best effort; the original error is what matters.
        let _ = fs::remove_file(&tmp_path);
    }
    outcome
}

/// `dir/.name.tmp` for `dir/name`.
fn temp_path(path: &Path) -> Result<PathBuf> {
    let parent = path
        .parent()
        .ok_or_else(|| ChatterError::io(format!("Path has no parent directory: {}", path.display())))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| ChatterError::io(format!("Path has no file name: {}", path.display())))?;

    let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
    Ok(parent.join(tmp_name))
}
