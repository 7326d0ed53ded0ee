//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Location
//!
//! Searched in order (first existing file wins):
//! 1. `--config <path>` on the command line
//! 2. `$DOCKER_REGISTRY_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/docker-registry/config.toml`
//! 4. `~/.docker-registry/config.toml`
//!
//! # Validation
//!
//! Config values are validated after parsing: the scheme must be `http` or
//! `https`, registry hosts must be non-empty and the credentials provider
//! must be known.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Top-level configuration.
///
/// # Example
///
/// ```toml
/// scheme = "https"
/// insecure_registries = ["localhost:5000"]
/// user_agent = "docker-registry-cli"
///
/// [credentials]
/// provider = "docker"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// URL scheme used to reach registries ("https" or "http")
    pub scheme: Option<String>,

    /// Hosts always reached over plain HTTP
    pub insecure_registries: Option<Vec<String>>,

    /// User-Agent header sent with every request
    pub user_agent: Option<String>,

    /// Credential lookup settings
    pub credentials: Option<CredentialsConfig>,
}

impl FileConfig {
    /// Valid URL schemes.
    pub const VALID_SCHEMES: &'static [&'static str] = &["https", "http"];

    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(scheme) = &self.scheme {
            if !Self::VALID_SCHEMES.contains(&scheme.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid scheme '{}', must be one of: {}",
                    scheme,
                    Self::VALID_SCHEMES.join(", ")
                )));
            }
        }

        if let Some(hosts) = &self.insecure_registries {
            if hosts.iter().any(|h| h.trim().is_empty()) {
                return Err(ConfigError::InvalidValue(
                    "insecure_registries cannot contain empty hosts".to_string(),
                ));
            }
        }

        if let Some(agent) = &self.user_agent {
            if agent.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "user_agent cannot be empty".to_string(),
                ));
            }
        }

        if let Some(credentials) = &self.credentials {
            credentials.validate()?;
        }

        Ok(())
    }
}

/// Credentials configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsConfig {
    /// Provider to use ("docker", "env" or "none")
    pub provider: Option<String>,
}

impl CredentialsConfig {
    /// Validate the credentials configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = &self.provider {
            let valid = crate::credentials::VALID_PROVIDERS;
            if !valid.contains(&provider.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid credentials provider '{}', must be one of: {}",
                    provider,
                    valid.join(", ")
                )));
            }
        }
        Ok(())
    }
}
