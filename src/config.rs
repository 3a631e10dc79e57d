//! Configuration management for db-questionnaire.
//!
//! Handles loading configuration from a TOML file with defaults for the
//! database to open, the questionnaire file to work on, and text rendering.

use crate::error::{QuestionnaireError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Database defaults.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Questionnaire file defaults.
    #[serde(default)]
    pub questionnaire: QuestionnaireConfig,

    /// Text output settings.
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Path to the SQLite file loaded when none is given on the command line.
    pub path: Option<PathBuf>,

    /// Open the database read-only.
    #[serde(default)]
    pub read_only: bool,
}

impl DatabaseConfig {
    /// Creates a config for the given database path.
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            read_only: false,
        }
    }

    /// Merges another config into this one, with the other taking precedence.
    pub fn merge(&mut self, other: &DatabaseConfig) {
        if other.path.is_some() {
            self.path = other.path.clone();
        }
        if other.read_only {
            self.read_only = true;
        }
    }

    /// Returns a display string for the configured database.
    pub fn display_string(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => "no database".to_string(),
        }
    }
}

/// Questionnaire file configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QuestionnaireConfig {
    /// Questionnaire JSON file used when none is given on the command line.
    pub path: Option<PathBuf>,
}

/// Text rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Maximum rows rendered per result.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    /// Maximum characters rendered per cell.
    #[serde(default = "default_max_column_width")]
    pub max_column_width: usize,
}

fn default_max_rows() -> usize {
    200
}

fn default_max_column_width() -> usize {
    40
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            max_column_width: default_max_column_width(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("db-questionnaire")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| QuestionnaireError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            QuestionnaireError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }
}
