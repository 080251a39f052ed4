//! Path management for webvault
//!
//! ## Path Resolution Order
//!
//! 1. `WEBVAULT_HOME` environment variable (if set)
//! 2. The platform config directory (`~/.config/webvault` on Linux,
//!    `~/Library/Application Support/webvault` on macOS, `%APPDATA%\webvault`
//!    on Windows)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::VaultError;

/// Environment variable overriding the base directory
pub const HOME_ENV: &str = "WEBVAULT_HOME";

/// Manages all local paths used by webvault
#[derive(Debug, Clone)]
pub struct VaultPaths {
    /// Base directory for config, staging and the filesystem store
    base_dir: PathBuf,
    /// Explicit settings file, when given on the command line
    settings_file: Option<PathBuf>,
}

impl VaultPaths {
    /// Resolve paths from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, VaultError> {
        let base_dir = match std::env::var(HOME_ENV) {
            Ok(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self::with_base_dir(base_dir))
    }

    /// Create VaultPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            settings_file: None,
        }
    }

    /// Use an explicit settings file instead of `<base>/config.json`
    pub fn with_settings_file(mut self, path: PathBuf) -> Self {
        self.settings_file = Some(path);
        self
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.settings_file
            .clone()
            .unwrap_or_else(|| self.base_dir.join("config.json"))
    }

    /// Default staging root (<base>/staging/)
    pub fn staging_dir(&self) -> PathBuf {
        self.base_dir.join("staging")
    }

    /// Default root of the filesystem object store (<base>/store/)
    pub fn store_dir(&self) -> PathBuf {
        self.base_dir.join("store")
    }

    /// Ensure the base directory exists
    pub fn ensure_directories(&self) -> Result<(), VaultError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| VaultError::Io(format!("Failed to create base directory: {}", e)))?;

        if let Some(parent) = self.settings_file().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| VaultError::Io(format!("Failed to create config directory: {}", e)))?;
        }

        Ok(())
    }

    /// Check if a settings file has been written
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, VaultError> {
    ProjectDirs::from("", "", "webvault")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| VaultError::Config("Could not determine a home directory".into()))
}
