//! credentials::traits
//!
//! Credential lookup trait definition.
//!
//! # Design
//!
//! The `CredentialStore` trait resolves registry credentials by host
//! name (e.g. `registry.example.com` or `localhost:5000`). Stores are
//! read-only: this tool never writes credentials.
//!
//! # Security
//!
//! Implementations MUST:
//! - Never log, print, or include passwords in error messages
//! - Be thread-safe (Send + Sync)

use thiserror::Error;

/// Errors from credential lookup.
///
/// Note: Error messages intentionally do not include secret values.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Failed to read the credential source.
    #[error("failed to read credentials: {0}")]
    ReadError(String),

    /// The credential source is malformed.
    #[error("malformed credentials: {0}")]
    Malformed(String),

    /// A credential helper failed.
    #[error("credential helper '{helper}' failed: {message}")]
    HelperFailed { helper: String, message: String },

    /// Provider not available or not configured.
    #[error("credentials provider not available: {0}")]
    ProviderNotAvailable(String),
}

/// Username and password for a registry.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login name
    pub username: String,
    /// Password or token
    pub password: String,
}

impl Credentials {
    /// Create credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Custom Debug to avoid exposing the password
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Trait for credential providers.
///
/// # Example
///
/// ```ignore
/// use docker_registry::credentials::{CredentialStore, DockerConfigStore};
///
/// let store = DockerConfigStore::new()?;
/// match store.get("registry.example.com")? {
///     Some(creds) => println!("logging in as {}", creds.username),
///     None => println!("anonymous access"),
/// }
/// ```
pub trait CredentialStore: Send + Sync {
    /// Provider name used in configuration.
    fn name(&self) -> &'static str;

    /// Get credentials for a host.
    ///
    /// Returns `Ok(None)` when the store has nothing for this host.
    fn get(&self, host: &str) -> Result<Option<Credentials>, CredentialError>;
}

/// A store that never has credentials.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymousStore;

impl CredentialStore for AnonymousStore {
    fn name(&self) -> &'static str {
        "none"
    }

    fn get(&self, _host: &str) -> Result<Option<Credentials>, CredentialError> {
        Ok(None)
    }
}
