//! Filesystem layout for saved conversations.
//!
//! # Directory Structure
//!
//! ```text
//! <save_dir>/
//! ├── individual_conversations/     # One file per finished conversation
//! │   ├── conversation_0.parquet
//! │   └── conversation_1.parquet
//! ├── conversations/
//! │   └── conversations.parquet     # Aggregate of all individual files
//! └── logs/
//!     └── chatterboxer.log.YYYY-MM-DD
//! ```

use chatterboxer_core::{ConversationId, config::StorageConfig, error::Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONVERSATION_EXTENSION: &str = "parquet";
pub const CONVERSATION_PREFIX: &str = "conversation_";
pub const CONFIG_FILE_NAME: &str = "chatterboxer.toml";

const INDIVIDUAL_DIR: &str = "individual_conversations";
const AGGREGATE_DIR: &str = "conversations";
const AGGREGATE_FILE: &str = "conversations.parquet";
const LOG_DIR: &str = "logs";

/// Resolved locations under one root save directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePaths {
    root: PathBuf,
    aggregate_override: Option<PathBuf>,
}

impl SavePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            aggregate_override: None,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            root: config.save_dir.clone(),
            aggregate_override: config.aggregate_file.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding `conversation_<id>.parquet` files.
    pub fn individual_dir(&self) -> PathBuf {
        self.root.join(INDIVIDUAL_DIR)
    }

    pub fn aggregate_file(&self) -> PathBuf {
        match &self.aggregate_override {
            Some(path) => path.clone(),
            None => self.root.join(AGGREGATE_DIR).join(AGGREGATE_FILE),
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join(LOG_DIR)
    }

    /// Creates the per-conversation and aggregate directories if missing.
    ///
    /// Must run before any ID allocation; the allocator never creates
    /// directories itself.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(self.individual_dir())?;
        if let Some(parent) = self.aggregate_file().parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

/// File name for a conversation ID, e.g. `conversation_7.parquet`.
pub fn conversation_file_name(id: ConversationId) -> String {
    format!("{CONVERSATION_PREFIX}{id}.{CONVERSATION_EXTENSION}")
}

/// Path to `<config_dir>/chatterboxer/config.toml`, if a config dir exists.
pub fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("chatterboxer").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_under_root() {
        let paths = SavePaths::new("save_data");
        assert_eq!(
            paths.individual_dir(),
            PathBuf::from("save_data/individual_conversations")
        );
        assert_eq!(
            paths.aggregate_file(),
            PathBuf::from("save_data/conversations/conversations.parquet")
        );
        assert_eq!(conversation_file_name(12), "conversation_12.parquet");
    }

    #[test]
    fn test_aggregate_override_from_config() {
        let config = StorageConfig {
            aggregate_file: Some(PathBuf::from("/tmp/out/all.parquet")),
            ..StorageConfig::default()
        };
        let paths = SavePaths::from_config(&config);
        assert_eq!(paths.aggregate_file(), PathBuf::from("/tmp/out/all.parquet"));
    }

    #[test]
    fn test_ensure_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = SavePaths::new(temp_dir.path().join("nested/save"));

        paths.ensure().unwrap();
        paths.ensure().unwrap();

        assert!(paths.individual_dir().is_dir());
        assert!(paths.aggregate_file().parent().unwrap().is_dir());
    }
}
