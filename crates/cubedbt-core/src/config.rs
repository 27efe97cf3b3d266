//! Configuration schema (cubedbt.toml)

use crate::types::SourceDialect;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "cubedbt.toml";

/// Default manifest location inside a dbt project
pub const DEFAULT_MANIFEST_PATH: &str = "target/manifest.json";

/// Model selection criteria
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Path prefixes; a model matches if its path starts with any of them
    #[serde(default)]
    pub paths: Vec<String>,

    /// Tags; a model matches only if it carries all of them
    #[serde(default)]
    pub tags: Vec<String>,

    /// Model names; empty means every name
    #[serde(default)]
    pub names: Vec<String>,
}

impl FilterConfig {
    /// True when no criterion restricts the selection
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.tags.is_empty() && self.names.is_empty()
    }

    /// Add criteria from `other` (used for CLI overrides)
    pub fn extend(&mut self, other: FilterConfig) {
        self.paths.extend(other.paths);
        self.tags.extend(other.tags);
        self.names.extend(other.names);
    }
}

/// Base indentation of rendered YAML blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndentConfig {
    /// Indentation of a model rendered as a cube
    #[serde(default = "default_cube_indent")]
    pub cube: usize,

    /// Indentation of a model's dimension list
    #[serde(default = "default_dimensions_indent")]
    pub dimensions: usize,

    /// Indentation of a single column rendered as a dimension
    #[serde(default = "default_dimension_indent")]
    pub dimension: usize,
}

fn default_cube_indent() -> usize {
    4
}

fn default_dimensions_indent() -> usize {
    6
}

fn default_dimension_indent() -> usize {
    8
}

impl Default for IndentConfig {
    fn default() -> Self {
        Self {
            cube: default_cube_indent(),
            dimensions: default_dimensions_indent(),
            dimension: default_dimension_indent(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path to manifest.json, relative to the project root
    #[serde(default)]
    pub manifest: Option<PathBuf>,

    /// URL to fetch manifest.json from instead of a local file
    #[serde(default)]
    pub manifest_url: Option<String>,

    /// Warehouse type names come from; unset layers every known dialect
    #[serde(default)]
    pub dialect: Option<SourceDialect>,

    /// Model selection
    #[serde(default)]
    pub filter: FilterConfig,

    /// Rendering indentation
    #[serde(default)]
    pub indent: IndentConfig,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest: None,
            manifest_url: None,
            dialect: None,
            filter: FilterConfig::default(),
            indent: IndentConfig::default(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.display().to_string(), e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let mut config: Config =
            toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.project_root = std::env::current_dir().unwrap_or_default();
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(path.display().to_string(), e.to_string()))?;

        Ok(())
    }

    /// Manifest file location, resolved against the project root
    pub fn manifest_path(&self) -> PathBuf {
        let relative = self
            .manifest
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST_PATH));

        if relative.is_absolute() {
            relative
        } else {
            self.project_root.join(relative)
        }
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    IoError(String, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
