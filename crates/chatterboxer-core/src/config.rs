use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root of the `chatterboxer.toml` configuration file.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Root save directory. Relative paths resolve against the working directory
    /// of the process that built the config.
    pub save_dir: PathBuf,
    /// Sort aggregate rows by conversation ID instead of directory-listing order.
    pub sort_by_id: bool,
    /// Overrides `<save_dir>/conversations/conversations.parquet`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate_file: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("save_data"),
            sort_by_id: true,
            aggregate_file: None,
        }
    }
}

/// Row ordering used when concatenating per-conversation files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregateOrder {
    /// Numeric conversation ID, ascending.
    #[default]
    ById,
    /// Whatever order the filesystem lists entries in.
    DirectoryListing,
}

impl StorageConfig {
    pub fn aggregate_order(&self) -> AggregateOrder {
        if self.sort_by_id {
            AggregateOrder::ById
        } else {
            AggregateOrder::DirectoryListing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"storage": {"sort_by_id": false}}"#).unwrap();
        assert_eq!(config.storage.save_dir, PathBuf::from("save_data"));
        assert_eq!(config.storage.aggregate_order(), AggregateOrder::DirectoryListing);
        assert!(config.storage.aggregate_file.is_none());
    }
}
