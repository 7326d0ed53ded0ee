//! registry::traits
//!
//! Registry trait definition.
//!
//! # Design
//!
//! The `Registry` trait is async because every operation is network I/O.
//! Callers still await one request at a time; nothing here runs
//! concurrently.
//!
//! Errors carry their kind, not their transport type: a missing manifest is
//! `RegistryError::NotFound` whichever implementation produced it, so
//! workflows match on [`RegistryError::is_not_found`] instead of
//! inspecting nested error types.

use async_trait::async_trait;
use thiserror::Error;

use super::manifest::ImageManifest;
use crate::core::types::{Digest, ManifestSchema};

/// Errors from registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The registry wants credentials and none were configured.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (bad credentials, token endpoint error, denied scope).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The registry returned an error status.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the registry
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The response could not be interpreted.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl RegistryError {
    /// The HTTP status this error corresponds to, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            RegistryError::AuthRequired => Some(401),
            RegistryError::NotFound(_) => Some(404),
            RegistryError::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check whether this is a not-found response.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// A manifest as returned by the registry, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawManifest {
    /// Value of the `Docker-Content-Digest` response header
    pub digest: Option<String>,
    /// Value of the `Content-Type` response header
    pub media_type: Option<String>,
    /// Response body
    pub body: Vec<u8>,
}

impl RawManifest {
    /// The body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The Registry trait for talking to a Docker Registry v2.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so they can be used from the
/// tokio runtime that drives each command.
///
/// # Error Handling
///
/// - `NotFound`: tag, manifest, blob or repository does not exist
/// - `AuthRequired` / `AuthFailed`: check credentials for the host
/// - `ApiError`: any other error status, message from the registry body
/// - `NetworkError`: check connectivity
/// - `InvalidResponse`: missing headers or undecodable bodies
#[async_trait]
pub trait Registry: Send + Sync {
    /// Base URL of the registry (e.g. `https://registry.example.com`).
    fn url(&self) -> &str;

    /// Check that the endpoint speaks the v2 API (`GET /v2/`).
    async fn ping(&self) -> Result<(), RegistryError>;

    /// List all repositories in the catalog.
    async fn repositories(&self) -> Result<Vec<String>, RegistryError>;

    /// List all tags of a repository.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the repository does not exist
    async fn tags(&self, name: &str) -> Result<Vec<String>, RegistryError>;

    /// Fetch a manifest by tag or digest, accepting the given schema.
    async fn manifest(
        &self,
        name: &str,
        reference: &str,
        schema: ManifestSchema,
    ) -> Result<RawManifest, RegistryError>;

    /// Fetch and decode a schema2 manifest.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the manifest does not exist
    /// - `InvalidResponse` if the body is not a schema2 manifest
    async fn manifest_v2(
        &self,
        name: &str,
        reference: &str,
    ) -> Result<ImageManifest, RegistryError> {
        let raw = self.manifest(name, reference, ManifestSchema::V2).await?;
        ImageManifest::from_slice(&raw.body)
    }

    /// Resolve a reference to its schema2 manifest digest (`HEAD`).
    ///
    /// # Errors
    ///
    /// - `NotFound` if the manifest does not exist
    /// - `InvalidResponse` if the digest header is missing or malformed
    async fn manifest_digest(&self, name: &str, reference: &str) -> Result<Digest, RegistryError>;

    /// Upload a manifest under a tag or digest reference.
    ///
    /// Returns the digest reported by the registry, if any.
    async fn put_manifest(
        &self,
        name: &str,
        reference: &str,
        manifest: &ImageManifest,
    ) -> Result<Option<Digest>, RegistryError>;

    /// Delete a manifest by digest. Every tag pointing at it goes too.
    async fn delete_manifest(&self, name: &str, digest: &Digest) -> Result<(), RegistryError>;

    /// Download a blob.
    async fn blob(&self, name: &str, digest: &Digest) -> Result<Vec<u8>, RegistryError>;
}
