//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. CLI flags (`--insecure` is applied by the command layer)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. An explicit path (from `--config`)
//! 2. `$DOCKER_REGISTRY_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/docker-registry/config.toml`
//! 4. `~/.docker-registry/config.toml`
//!
//! An explicit path that does not exist is an error; the other locations
//! are skipped when missing.
//!
//! # Example
//!
//! ```no_run
//! use docker_registry::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("Scheme: {}", config.scheme());
//! println!("Credentials: {}", config.credentials_provider());
//! ```

pub mod schema;

pub use schema::{CredentialsConfig, FileConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default User-Agent header value.
pub const DEFAULT_USER_AGENT: &str = concat!("docker-registry-cli/", env!("CARGO_PKG_VERSION"));

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "DOCKER_REGISTRY_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Loaded configuration.
///
/// Accessor methods apply defaults for anything the file leaves unset.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Values read from the config file
    pub file: FileConfig,
    /// Path to the config file (if loaded)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration, optionally from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// validated, or if `explicit` points at a missing file.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from(path);
        }

        match Self::discover() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load and validate a specific config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let file = Self::read_config(path)?;
        file.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(Self {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    /// Find the first existing config file in the standard locations.
    fn discover() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("docker-registry/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".docker-registry/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Read and parse a config file.
    fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// URL scheme for registries not listed as insecure.
    ///
    /// Defaults to "https" if not configured.
    pub fn scheme(&self) -> &str {
        self.file.scheme.as_deref().unwrap_or("https")
    }

    /// URL scheme to use for a specific host.
    pub fn scheme_for(&self, host: &str) -> &str {
        if self.is_insecure(host) {
            "http"
        } else {
            self.scheme()
        }
    }

    /// Check whether a host is configured as insecure (plain HTTP).
    pub fn is_insecure(&self, host: &str) -> bool {
        self.file
            .insecure_registries
            .as_ref()
            .map(|hosts| hosts.iter().any(|h| h.trim() == host))
            .unwrap_or(false)
    }

    /// User-Agent header value.
    pub fn user_agent(&self) -> &str {
        self.file.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Get the credentials provider.
    ///
    /// Defaults to "docker" if not configured.
    pub fn credentials_provider(&self) -> &str {
        self.file
            .credentials
            .as_ref()
            .and_then(|c| c.provider.as_deref())
            .unwrap_or(crate::credentials::DEFAULT_PROVIDER)
    }

    /// Get the path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
