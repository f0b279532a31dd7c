//! Settings file handling.
//!
//! Settings live in a small JSON file with PascalCase keys:
//!
//! ```json
//! {
//!   "Token": "…",
//!   "Endpoint": "https://books.example.com",
//!   "BooksDirectory": "/mnt/onboard/kosync"
//! }
//! ```
//!
//! A missing file is created with defaults on first load so the user has
//! something to edit.

use kosync_engine::{DownloadPolicy, SyncConfig, SyncCredentials};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name of the settings file.
pub const CONFIG_FILE_NAME: &str = ".kosyncConfig.json";

/// Library location on a Kobo device.
pub const DEFAULT_BOOKS_DIRECTORY: &str = "/mnt/onboard/kosync";

/// Result type for settings operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read or written.
    #[error("cannot access config file {}: {source}", .path.display())]
    Io {
        /// Settings file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The settings file is not valid JSON.
    #[error("invalid config file {}: {source}", .path.display())]
    Parse {
        /// Settings file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A required field is empty.
    #[error("config field {0} is not set")]
    Missing(&'static str),

    /// A field holds a value that cannot work.
    #[error("config field {field} is invalid: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Contents of the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    /// Bearer token for the sync server.
    #[serde(default)]
    pub token: String,
    /// Base URL of the sync server.
    #[serde(default)]
    pub endpoint: String,
    /// Directory books are stored in.
    #[serde(default = "default_books_directory")]
    pub books_directory: PathBuf,
    /// Per-request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_books_directory() -> PathBuf {
    PathBuf::from(DEFAULT_BOOKS_DIRECTORY)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token: String::new(),
            endpoint: String::new(),
            books_directory: default_books_directory(),
            timeout_secs: None,
        }
    }
}

impl Settings {
    /// Returns the settings path next to the running executable.
    pub fn default_path() -> io::Result<PathBuf> {
        let exe = std::env::current_exe()?;
        let dir = exe.parent().unwrap_or_else(|| Path::new("."));
        Ok(dir.join(CONFIG_FILE_NAME))
    }

    /// Loads settings from `path`, writing a default file first if absent.
    pub fn load_or_create(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            let settings = Settings::default();
            settings.save(path)?;
            tracing::info!(path = %path.display(), "wrote default config file");
            return Ok(settings);
        }
        Self::load(path)
    }

    /// Loads settings from `path`.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let bytes = fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes settings to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_vec_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(path, json).map_err(io_error)
    }

    /// Checks that the fields a sync needs are set.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::Missing("Token"));
        }
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Missing("Endpoint"));
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid {
                field: "TimeoutSecs",
                reason: "must be at least 1 second",
            });
        }
        Ok(())
    }

    /// Builds the engine configuration.
    pub fn sync_config(&self, policy: DownloadPolicy) -> ConfigResult<SyncConfig> {
        self.validate()?;
        let credentials =
            SyncCredentials::new(self.endpoint.trim(), self.token.trim(), &self.books_directory);
        let mut config = SyncConfig::new(credentials).with_policy(policy);
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}
