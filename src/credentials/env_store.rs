//! credentials::env_store
//!
//! Credentials from environment variables.
//!
//! `DOCKER_REGISTRY_USERNAME` and `DOCKER_REGISTRY_PASSWORD` apply to
//! every host. Both must be set for credentials to be returned.

use super::traits::{CredentialError, CredentialStore, Credentials};

/// Environment variable holding the username.
pub const USERNAME_ENV: &str = "DOCKER_REGISTRY_USERNAME";

/// Environment variable holding the password.
pub const PASSWORD_ENV: &str = "DOCKER_REGISTRY_PASSWORD";

/// Credential store reading environment variables.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvStore;

impl EnvStore {
    /// Build credentials from optional username and password values.
    fn from_values(username: Option<String>, password: Option<String>) -> Option<Credentials> {
        match (username, password) {
            (Some(u), Some(p)) if !u.is_empty() => Some(Credentials::new(u, p)),
            _ => None,
        }
    }
}

impl CredentialStore for EnvStore {
    fn name(&self) -> &'static str {
        "env"
    }

    fn get(&self, _host: &str) -> Result<Option<Credentials>, CredentialError> {
        Ok(Self::from_values(
            std::env::var(USERNAME_ENV).ok(),
            std::env::var(PASSWORD_ENV).ok(),
        ))
    }
}
