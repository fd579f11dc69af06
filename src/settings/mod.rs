//! # Settings Module
//!
//! Persisted user preferences. Loading is best-effort: a missing or corrupt
//! preferences file falls back to defaults, so startup never fails on
//! configuration.

use crate::error::{LinePortError, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Baud rate used when no preference has been persisted.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Persisted preferences, stored as TOML under the user config directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Last-used baud rate, pre-selected at startup.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

impl Preferences {
    /// Loads preferences, falling back to defaults when the file is absent,
    /// unreadable, or corrupt.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Persists the preferences, creating the config directory if needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| LinePortError::invalid_config("no user config directory available"))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| LinePortError::invalid_config(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lineport").join("preferences.toml"))
    }

    fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(_) => Self::default(),
        }
    }

    fn from_toml_str(content: &str) -> Self {
        match toml::from_str(content) {
            Ok(preferences) => preferences,
            Err(e) => {
                warn!("Ignoring corrupt preferences file: {e}");
                Self::default()
            }
        }
    }
}
