//! Platform-specific directory management
//!
//! Provides the gallery root and config directory.
//!
//! Environment variables can override default directories:
//! - `EXTGALLERY_ROOT` - Override the gallery root
//! - `EXTGALLERY_CONFIG_DIR` - Override config directory

use std::env;
use std::path::{Path, PathBuf};

use crate::config::defaults::{EXTENSIONS_SUBDIR, STAGING_SUBDIR};

/// Environment variable names for directory overrides
pub const ENV_ROOT_DIR: &str = "EXTGALLERY_ROOT";
pub const ENV_CONFIG_DIR: &str = "EXTGALLERY_CONFIG_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "extgallery";

/// Directory provider for the gallery
///
/// The root holds the package store (`extensions/`) and the upload
/// staging area (`temp/`).
#[derive(Debug, Clone)]
pub struct GalleryDirs {
    root_dir: PathBuf,
    config_dir: PathBuf,
    root_overridden: bool,
}

impl GalleryDirs {
    /// Create a new `GalleryDirs` instance
    ///
    /// Checks environment variables first, then falls back to platform defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root_dir: Self::resolve_root_dir(),
            config_dir: Self::resolve_config_dir(),
            root_overridden: env::var_os(ENV_ROOT_DIR).is_some(),
        }
    }

    /// Create an instance with explicit paths
    #[must_use]
    pub fn with_paths(root_dir: PathBuf, config_dir: PathBuf) -> Self {
        Self {
            root_dir,
            config_dir,
            root_overridden: false,
        }
    }

    /// Replace the gallery root, keeping the config directory
    #[must_use]
    pub fn with_root(mut self, root_dir: impl AsRef<Path>) -> Self {
        self.root_dir = root_dir.as_ref().to_path_buf();
        self.root_overridden = true;
        self
    }

    /// Whether the root came from the environment or an explicit override
    ///
    /// An overridden root takes precedence over the config file.
    #[must_use]
    pub fn root_overridden(&self) -> bool {
        self.root_overridden
    }

    /// Get the gallery root
    ///
    /// - Linux: `$XDG_DATA_HOME/extgallery` or `~/.local/share/extgallery`
    /// - macOS: `~/Library/Application Support/extgallery`
    #[must_use]
    pub fn root_dir(&self) -> PathBuf {
        self.root_dir.clone()
    }

    /// Get the config directory path
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Directory with one subdirectory per package ID
    #[must_use]
    pub fn extensions_dir(&self) -> PathBuf {
        self.root_dir.join(EXTENSIONS_SUBDIR)
    }

    /// Directory under which each upload gets a fresh staging directory
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.root_dir.join(STAGING_SUBDIR)
    }

    /// Get the global config file path
    #[must_use]
    pub fn global_config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Resolve the gallery root from environment or platform default
    fn resolve_root_dir() -> PathBuf {
        if let Ok(path) = env::var(ENV_ROOT_DIR) {
            return PathBuf::from(path);
        }

        Self::platform_data_dir()
    }

    /// Resolve config directory from environment or platform default
    fn resolve_config_dir() -> PathBuf {
        if let Ok(path) = env::var(ENV_CONFIG_DIR) {
            return PathBuf::from(path);
        }

        Self::platform_config_dir()
    }

    /// Get platform-specific config directory
    fn platform_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                // Fallback to home directory
                dirs::home_dir()
                    .map(|h| h.join(".config").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".config").join(APP_NAME))
            })
    }

    /// Get platform-specific data directory
    fn platform_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".local").join("share").join(APP_NAME))
                    .unwrap_or_else(|| {
                        PathBuf::from(".")
                            .join(".local")
                            .join("share")
                            .join(APP_NAME)
                    })
            })
    }
}

impl Default for GalleryDirs {
    fn default() -> Self {
        Self::new()
    }
}
