//! credentials
//!
//! Registry credential lookup by host name.
//!
//! # Architecture
//!
//! Credentials are resolved through the `CredentialStore` trait, which has
//! multiple implementations:
//!
//! - [`DockerConfigStore`]: Docker client `config.json` (default)
//! - [`EnvStore`]: `DOCKER_REGISTRY_USERNAME` / `DOCKER_REGISTRY_PASSWORD`
//! - [`AnonymousStore`]: never returns credentials
//!
//! # Security
//!
//! - Passwords are **never** logged or included in error messages
//! - `Credentials` redacts the password in its `Debug` output
//!
//! # Example
//!
//! ```ignore
//! use docker_registry::credentials::create_store;
//!
//! let store = create_store("docker")?;
//! let creds = store.get("registry.example.com")?;
//! ```

mod docker_config;
mod env_store;
mod traits;

pub use docker_config::DockerConfigStore;
pub use env_store::{EnvStore, PASSWORD_ENV, USERNAME_ENV};
pub use traits::{AnonymousStore, CredentialError, CredentialStore, Credentials};

/// The default credentials provider name.
pub const DEFAULT_PROVIDER: &str = "docker";

/// Valid provider names.
pub const VALID_PROVIDERS: &[&str] = &["docker", "env", "none"];

/// Create a credential store based on the provider name.
///
/// # Providers
///
/// - `"docker"` (default): [`DockerConfigStore`]
/// - `"env"`: [`EnvStore`]
/// - `"none"`: [`AnonymousStore`]
///
/// # Errors
///
/// - Unknown provider name
/// - Initialization errors from the store
pub fn create_store(provider: &str) -> Result<Box<dyn CredentialStore>, CredentialError> {
    match provider {
        "docker" => Ok(Box::new(DockerConfigStore::new()?)),
        "env" => Ok(Box::new(EnvStore)),
        "none" => Ok(Box::new(AnonymousStore)),
        other => Err(CredentialError::ProviderNotAvailable(format!(
            "unknown credentials provider: '{}' (valid: {})",
            other,
            VALID_PROVIDERS.join(", ")
        ))),
    }
}
