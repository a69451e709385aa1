//! Configuration for vtshim.
//!
//! Settings are read from `~/.vtshim/config.toml`; a missing or broken file
//! means defaults. Command line flags override file values.
//!
//! # Configuration File
//!
//! ```toml
//! [emulation]
//! # Write escape sequences literally instead of interpreting them
//! skip_ansi_emulation = false
//! # Switch a CP850 console to CP858 so the euro sign renders
//! euro_codepage = false
//!
//! [log]
//! # error, warn, info, debug, trace
//! level = "info"
//! ```
//!
//! The `VTSHIM_SKIP_ANSI_EMULATION` environment variable, when present,
//! forces `skip_ansi_emulation` on regardless of the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShimError};

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Escape emulation settings
    pub emulation: EmulationConfig,
    /// Log settings
    pub log: LogConfig,
}

/// Escape emulation configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulationConfig {
    pub skip_ansi_emulation: bool,
    pub euro_codepage: bool,
}

/// Log configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl FromStr for Config {
    type Err = ShimError;

    fn from_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Self {
        Self::get_config_path()
            .and_then(|path| Self::from_path(&path).ok())
            .unwrap_or_default()
    }

    /// Load configuration from `path`
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        content.parse()
    }

    /// Render as TOML
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Directory holding the config file and the log
    pub fn config_dir() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".vtshim"))
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}
