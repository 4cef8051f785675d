//! TOML-backed storage for [`AppConfig`].

use super::atomic_file::atomic_write;
use crate::paths::{CONFIG_FILE_NAME, user_config_file};
use chatterboxer_core::{ChatterError, config::AppConfig, error::Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Handle to a config file on disk.
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Picks the config file to use.
    ///
    /// Order: `explicit`, then `./chatterboxer.toml` if present, then the
    /// per-user config file. The last is returned even when it doesn't exist
    /// yet so `init-config` has somewhere to write.
    pub fn resolve(explicit: Option<&Path>) -> Self {
        Self::resolve_with(explicit, user_config_file())
    }

    /// [`resolve`](Self::resolve) with the per-user file supplied by the caller.
    ///
    /// Without a per-user config directory the local `./chatterboxer.toml` is
    /// used, and a missing file there just means defaults.
    pub fn resolve_with(explicit: Option<&Path>, user_file: Option<PathBuf>) -> Self {
        if let Some(path) = explicit {
            return Self::new(path);
        }
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.is_file() {
            return Self::new(local);
        }
        match user_file {
            Some(path) => Self::new(path),
            None => {
                tracing::debug!(
                    "No user config directory, falling back to {}",
                    local.display()
                );
                Self::new(local)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the config file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(AppConfig))`: file found and parsed
    /// - `Ok(None)`: file doesn't exist or is empty
    /// - `Err(_)`: file exists but cannot be read or parsed
    pub fn load(&self) -> Result<Option<AppConfig>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        toml::from_str(&content)
            .map(Some)
            .map_err(|e| ChatterError::serialization(self.path.display().to_string(), e.to_string()))
    }

    /// Loads the config, falling back to defaults when there is no file.
    pub fn load_or_default(&self) -> Result<AppConfig> {
        Ok(self.load()?.unwrap_or_default())
    }

    /// Writes `config` atomically, creating parent directories as needed.
    pub fn save(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| ChatterError::serialization("TOML", e.to_string()))?;

        atomic_write(&self.path, |mut file| {
            file.write_all(toml_string.as_bytes())?;
            Ok(file)
        })
    }
}
