//! Configuration module for filekeep.

use serde::Deserialize;
use std::path::Path;

use crate::file::DEFAULT_MAX_UPLOAD_SIZE;
use crate::{FilekeepError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3011
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory all request paths are resolved under.
    #[serde(default = "default_storage_root")]
    pub root: String,
    /// Maximum request body size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Sort listing children by name.
    #[serde(default)]
    pub sort_children: bool,
}

fn default_storage_root() -> String {
    "storage-root".to_string()
}

fn default_max_upload_size() -> u64 {
    DEFAULT_MAX_UPLOAD_SIZE / 1024 / 1024
}

impl StorageConfig {
    /// Maximum request body size in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.max_upload_size_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            max_upload_size_mb: default_max_upload_size(),
            sort_children: false,
        }
    }
}

/// Security configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SecurityConfig {
    /// Plain secret required by delete requests.
    #[serde(default)]
    pub delete_password: String,
    /// Argon2 PHC hash of the delete secret. Takes precedence over
    /// `delete_password`.
    #[serde(default)]
    pub delete_password_hash: String,
}

/// Web configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WebConfig {
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Empty logs to the console only.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/filekeep.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// File storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Security configuration.
    #[serde(default)]
    pub security: SecurityConfig,
    /// Web configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FilekeepError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FilekeepError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FILEKEEP_DELETE_PASSWORD`: Override the delete secret
    /// - `FILEKEEP_STORAGE_ROOT`: Override the storage root
    pub fn apply_env_overrides(&mut self) {
        if let Ok(password) = std::env::var("FILEKEEP_DELETE_PASSWORD") {
            if !password.is_empty() {
                self.security.delete_password = password;
            }
        }

        if let Ok(root) = std::env::var("FILEKEEP_STORAGE_ROOT") {
            if !root.is_empty() {
                self.storage.root = root;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - The storage root is empty
    /// - The upload limit is zero
    pub fn validate(&self) -> Result<()> {
        if self.storage.root.trim().is_empty() {
            return Err(FilekeepError::Validation(
                "storage.root must not be empty".to_string(),
            ));
        }
        if self.storage.max_upload_size_mb == 0 {
            return Err(FilekeepError::Validation(
                "storage.max_upload_size_mb must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
