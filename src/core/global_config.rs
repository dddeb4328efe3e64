//! Global configuration management
//!
//! Reads settings from `config.toml` in the config directory.
//! Global settings include the gallery root, upload limits and
//! output preferences.

use crate::infra::dirs::GalleryDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Global configuration error types
#[derive(Error, Debug)]
pub enum GlobalConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: String, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: String, error: String },
}

/// Global configuration for the gallery
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalConfig {
    /// Storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Upload ingestion settings
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Output preferences
    #[serde(default)]
    pub output: OutputConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Gallery root holding `extensions/` and `temp/`
    pub root: Option<PathBuf>,
}

/// Upload ingestion configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestConfig {
    /// Maximum accepted archive size in bytes
    pub max_archive_size: Option<u64>,
}

/// Output preferences
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Enable quiet mode
    pub quiet: Option<bool>,

    /// Enable JSON output
    pub json: Option<bool>,
}

impl GlobalConfig {
    /// Load global configuration from the config directory
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `GlobalConfigError::ParseError` if the config file exists but
    /// contains invalid TOML.
    pub fn load(dirs: &GalleryDirs) -> Result<Self, GlobalConfigError> {
        let config_path = dirs.global_config_path();
        Self::load_from_path(&config_path)
    }

    /// Load global configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, GlobalConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| GlobalConfigError::ReadError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| GlobalConfigError::ParseError {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Get the effective gallery root
    ///
    /// An explicit or environment root wins, then the configured root,
    /// then the platform default.
    #[must_use]
    pub fn gallery_root(&self, dirs: &GalleryDirs) -> PathBuf {
        if dirs.root_overridden() {
            return dirs.root_dir();
        }
        self.storage
            .root
            .clone()
            .unwrap_or_else(|| dirs.root_dir())
    }

    /// Get the archive size limit, if any
    #[must_use]
    pub fn max_archive_size(&self) -> Option<u64> {
        self.ingest.max_archive_size
    }
}
