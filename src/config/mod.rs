//! Configuration system for stepquill.
//!
//! Settings are read from a TOML file and every field falls back to a default
//! when absent, so a partial file is valid.
//!
//! # Example
//!
//! ```
//! use stepquill::config::Config;
//!
//! let config = Config::default();
//! assert_eq!(config.undo_limit, 100);
//! assert!(config.edit_new_steps);
//!
//! let custom = Config {
//!     undo_limit: 20,
//!     ..Config::default()
//! };
//! assert_eq!(custom.log_filter, "warn");
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Configuration for the stepquill editor.
///
/// # Fields
///
/// * `undo_limit` - Maximum number of edits kept in history, 0 for unlimited (default: 100)
/// * `edit_new_steps` - Begin in-place editing of newly added steps (default: true)
/// * `log_filter` - `tracing` filter used when `RUST_LOG` is unset (default: "warn")
/// * `default_step_name` - Name given to steps added without one (default: "New Step")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Maximum number of edits kept in history
    #[serde(default = "default_undo_limit")]
    pub undo_limit: usize,

    /// Begin in-place editing of newly added steps
    #[serde(default = "default_edit_new_steps")]
    pub edit_new_steps: bool,

    /// Log filter directive
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Name for steps added without one
    #[serde(default = "default_step_name")]
    pub default_step_name: String,
}

fn default_undo_limit() -> usize {
    crate::edit::history::DEFAULT_LIMIT
}

fn default_edit_new_steps() -> bool {
    true
}

fn default_log_filter() -> String {
    "warn".to_string()
}

fn default_step_name() -> String {
    "New Step".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            undo_limit: default_undo_limit(),
            edit_new_steps: default_edit_new_steps(),
            log_filter: default_log_filter(),
            default_step_name: default_step_name(),
        }
    }
}

impl Config {
    /// Returns the path to the config file.
    ///
    /// Uses `~/.config/stepquill/config.toml` on all platforms.
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("stepquill");
            path.push("config.toml");
            path
        })
    }

    /// Loads configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist or can't be read.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Loads configuration from `path`, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "ignoring malformed config");
                Self::default()
            }),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not read config");
                Self::default()
            }
        }
    }

    /// Saves configuration to the default config file.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("undo_limit = 5").unwrap();
        assert_eq!(config.undo_limit, 5);
        assert!(config.edit_new_steps);
        assert_eq!(config.default_step_name, "New Step");
    }
}
