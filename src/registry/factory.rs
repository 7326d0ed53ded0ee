//! registry::factory
//!
//! Registry client creation.
//!
//! # Design
//!
//! Commands use `create_registry()` instead of constructing `HttpRegistry`
//! directly, so the workflows only ever see `dyn Registry`. The factory
//! also checks that the endpoint answers `GET /v2/` before handing the
//! client out, so an unreachable or non-registry host fails early with a
//! clear message rather than on the first real request.

use super::http::HttpRegistry;
use super::traits::{Registry, RegistryError};
use crate::core::config::DEFAULT_USER_AGENT;
use crate::credentials::Credentials;

/// Build the base URL of a registry from a scheme and a server host.
///
/// # Example
///
/// ```
/// use docker_registry::registry::registry_url;
///
/// assert_eq!(registry_url("https", "registry.example.com"), "https://registry.example.com");
/// assert_eq!(registry_url("http", "localhost:5000/"), "http://localhost:5000");
/// ```
pub fn registry_url(scheme: &str, server: &str) -> String {
    format!("{}://{}", scheme, server.trim_end_matches('/'))
}

/// Create a registry client and verify the endpoint.
///
/// # Arguments
///
/// * `url` - Base URL such as `https://registry.example.com`
/// * `credentials` - Credentials for the host, if any
/// * `user_agent` - Override for the `User-Agent` header
///
/// # Errors
///
/// - `NetworkError` if the host cannot be reached
/// - `AuthRequired` / `AuthFailed` if the ping is rejected
/// - Any other error status from `GET /v2/`
pub async fn create_registry(
    url: &str,
    credentials: Option<Credentials>,
    user_agent: Option<&str>,
) -> Result<Box<dyn Registry>, RegistryError> {
    let registry = HttpRegistry::new(url, credentials, user_agent.unwrap_or(DEFAULT_USER_AGENT))?;

    tracing::debug!(url, "checking registry endpoint");
    registry.ping().await?;

    Ok(Box::new(registry))
}
