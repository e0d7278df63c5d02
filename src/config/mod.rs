//! Configuration management for tabsaver.
//!
//! Handles loading of user preferences: the default window label, where the
//! store lives, and which urls are skipped or remapped when a saved window
//! is reopened.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::window::{UrlPolicy, UrlRule};

/// Label used when a window is saved with an empty name.
pub const DEFAULT_NAME: &str = "Window";

/// Main configuration struct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Display name substituted for an empty one
    #[serde(default = "default_name")]
    pub default_name: String,

    /// Store file; `None` means the platform data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    /// Ordered skip/remap rules applied when reopening a window
    #[serde(default = "UrlPolicy::default_rules")]
    pub url_rules: Vec<UrlRule>,
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_name: default_name(),
            store_path: None,
            url_rules: UrlPolicy::default_rules(),
        }
    }
}

impl Config {
    /// Load configuration from disk, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file, or return default if not found
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate();

        Ok(config)
    }

    /// Save configuration to disk
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Drop rules that could never match and restore an empty default name
    pub fn validate(&mut self) {
        self.url_rules.retain(|rule| !rule.pattern.is_empty());
        if self.default_name.trim().is_empty() {
            self.default_name = default_name();
        }
    }

    /// Store file to use, resolving the platform default when unset
    pub fn resolved_store_path(&self) -> Result<PathBuf> {
        match &self.store_path {
            Some(path) => Ok(path.clone()),
            None => {
                let data_dir = dirs::data_dir().context("Could not find data directory")?;
                Ok(data_dir.join("tabsaver").join("store.json"))
            }
        }
    }

    pub fn url_policy(&self) -> UrlPolicy {
        UrlPolicy::new(self.url_rules.clone())
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not find config directory")?;

        Ok(config_dir.join("tabsaver").join("config.toml"))
    }
}
