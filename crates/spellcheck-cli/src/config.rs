//! Spellcheck CLI Configuration
//!
//! The application configuration wraps the tracker's game settings with
//! storage locations and console adapter settings. It is loaded from a TOML
//! file; missing sections and keys fall back to defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use spellcheck_core::TrackerConfig;

use crate::error::{CliError, Result};

// ----------------------------------------------------------------------------
// Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the `spellcheck` binary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Game settings
    pub tracker: TrackerConfig,
    /// Where state lives on disk
    pub storage: StorageConfig,
    /// Console adapter settings
    pub console: ConsoleConfig,
}

/// On-disk layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base directory; defaults to the platform data directory
    pub data_dir: Option<PathBuf>,
    /// Session snapshot file name inside the data directory
    pub snapshot_file: String,
    /// Screenshot directory inside the data directory
    pub attachment_dir: String,
}

/// Console chat settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Channel name console messages are attributed to
    pub channel: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            snapshot_file: "session.json".to_string(),
            attachment_dir: "attachments".to_string(),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            channel: "general".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path.as_ref(), toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> Result<()> {
        self.tracker
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;

        for (field, value) in [
            ("storage.snapshot_file", &self.storage.snapshot_file),
            ("storage.attachment_dir", &self.storage.attachment_dir),
        ] {
            if value.trim().is_empty() {
                return Err(CliError::Config(format!("{} must not be empty", field)));
            }
        }

        if self.storage.snapshot_file == self.storage.attachment_dir {
            return Err(CliError::Config(
                "Snapshot file and attachment directory must differ".to_string(),
            ));
        }

        if self.console.channel.trim().is_empty() {
            return Err(CliError::Config(
                "console.channel must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Effective data directory
    pub fn data_dir(&self) -> PathBuf {
        self.storage.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("spellcheck")
        })
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.snapshot_file)
    }

    pub fn attachment_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.attachment_dir)
    }

    /// Create example configuration file content
    pub fn example_config() -> String {
        let example = AppConfig {
            storage: StorageConfig {
                data_dir: Some(PathBuf::from("./spellcheck-data")),
                ..StorageConfig::default()
            },
            ..AppConfig::default()
        };

        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| "# Failed to generate example config".to_string())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
