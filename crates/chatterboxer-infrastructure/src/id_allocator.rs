//! Conversation ID allocation by scanning the per-conversation directory.

use crate::paths::{CONVERSATION_EXTENSION, CONVERSATION_PREFIX};
use chatterboxer_core::{ChatterError, ConversationId, error::Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Parses the ID out of a `conversation_<id>.parquet` path.
///
/// Returns `None` for anything that doesn't match exactly, including signed
/// or non-decimal IDs.
pub fn parse_conversation_id(path: &Path) -> Option<ConversationId> {
    if path.extension()?.to_str()? != CONVERSATION_EXTENSION {
        return None;
    }
    let digits = path.file_stem()?.to_str()?.strip_prefix(CONVERSATION_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Lists recognized conversation files as `(id, path)` in directory-listing order.
///
/// # Errors
///
/// - `Configuration` if `directory` does not exist
/// - `Io` for any other listing failure
pub fn list_conversation_files(directory: &Path) -> Result<Vec<(ConversationId, PathBuf)>> {
    let entries = fs::read_dir(directory).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            ChatterError::configuration(format!(
                "Conversation directory does not exist: {}",
                directory.display()
            ))
        } else {
            ChatterError::from(e)
        }
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_file() {
            tracing::debug!("[IdAllocator] Skipping non-file entry {}", path.display());
            continue;
        }
        match parse_conversation_id(&path) {
            Some(id) => files.push((id, path)),
            None => tracing::debug!("[IdAllocator] Skipping stray file {}", path.display()),
        }
    }
    Ok(files)
}

/// Returns `max(existing ids) + 1`, or `0` when no conversation has been saved.
pub fn next_id(directory: &Path) -> Result<ConversationId> {
    let highest = list_conversation_files(directory)?
        .into_iter()
        .map(|(id, _)| id)
        .max();

    match highest {
        Some(id) => id
            .checked_add(1)
            .ok_or_else(|| ChatterError::internal("Conversation ID space exhausted")),
        None => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_empty_directory_starts_at_zero() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(next_id(temp_dir.path()).unwrap(), 0);
    }

    #[test]
    fn test_next_id_follows_highest_with_gaps() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["conversation_0.parquet", "conversation_2.parquet", "conversation_5.parquet"] {
            touch(temp_dir.path(), name);
        }
        assert_eq!(next_id(temp_dir.path()).unwrap(), 6);
    }

    #[test]
    fn test_missing_directory_is_configuration_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = next_id(&temp_dir.path().join("absent")).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_stray_files_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        for name in [
            "conversation_3.parquet",
            "conversation_10.json",
            "conversation_x.parquet",
            "conversation_-4.parquet",
            "conversation_+9.parquet",
            "notes.parquet",
            "conversation_.parquet",
            ".conversation_40.parquet.tmp",
        ] {
            touch(temp_dir.path(), name);
        }
        fs::create_dir(temp_dir.path().join("conversation_99.parquet")).unwrap();

        let files = list_conversation_files(temp_dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, 3);
        assert_eq!(next_id(temp_dir.path()).unwrap(), 4);
    }

    #[test]
    fn test_parse_conversation_id() {
        assert_eq!(parse_conversation_id(Path::new("a/conversation_7.parquet")), Some(7));
        assert_eq!(parse_conversation_id(Path::new("conversation_007.parquet")), Some(7));
        assert_eq!(parse_conversation_id(Path::new("conversation_7.PARQUET")), None);
        assert_eq!(parse_conversation_id(Path::new("conversations.parquet")), None);
    }
}
