//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::config_path;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Debug output settings
    #[serde(default)]
    pub debug: DebugConfig,

    /// Settings for the built-in exec plugin
    #[serde(default)]
    pub exec: ExecConfig,

    /// Scenario run settings
    #[serde(default)]
    pub run: RunConfig,
}

/// Where debug lines from the engine and plugins go
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct DebugConfig {
    /// Write debug lines even without `--debug`
    #[serde(default)]
    pub enabled: bool,

    /// Append debug lines to this file instead of stderr
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Exec plugin configuration
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct ExecConfig {
    /// Shell for exec units that name none, in the unit or scenario defaults
    #[serde(default)]
    pub shell: Option<String>,
}

/// Scenario run settings
#[derive(Debug, Deserialize, PartialEq)]
pub struct RunConfig {
    /// File extensions picked up when a directory is given
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Stop after the first scenario that fails
    #[serde(default)]
    pub fail_fast: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            fail_fast: false,
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["yaml".to_string(), "yml".to_string()]
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))
    }
}
