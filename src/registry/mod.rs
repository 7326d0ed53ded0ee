//! registry
//!
//! Client abstraction for the Docker Registry HTTP API v2.
//!
//! # Architecture
//!
//! The `Registry` trait defines the handful of v2 calls this tool needs.
//! Commands use the [`create_registry`] factory function rather than
//! constructing an implementation directly, and pass the resulting client
//! by reference through the workflows in [`crate::engine`].
//!
//! # Modules
//!
//! - `traits`: Core `Registry` trait, error kinds and response types
//! - [`manifest`]: Schema2 manifest and image config documents
//! - [`http`]: `reqwest` implementation with token/basic auth
//! - [`mock`]: In-memory content-addressable registry for tests
//! - `factory`: URL construction and connection check
//!
//! # Example
//!
//! ```ignore
//! use docker_registry::registry::{create_registry, Registry};
//!
//! let registry = create_registry("https://registry.example.com", None, None).await?;
//! for name in registry.repositories().await? {
//!     println!("{}", name);
//! }
//! ```

mod factory;
pub mod http;
pub mod manifest;
pub mod mock;
mod traits;

pub use factory::{create_registry, registry_url};
pub use manifest::{Descriptor, ImageConfig, ImageManifest};
pub use traits::*;

/// Media type of a v2 schema1 manifest.
pub const MEDIA_TYPE_MANIFEST_V1: &str = "application/vnd.docker.distribution.manifest.v1+json";

/// Media type of a v2 schema2 manifest.
pub const MEDIA_TYPE_MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";

/// Media type of a schema2 image config blob.
pub const MEDIA_TYPE_IMAGE_CONFIG: &str = "application/vnd.docker.container.image.v1+json";

/// Header carrying the canonical digest of a manifest.
pub const DIGEST_HEADER: &str = "Docker-Content-Digest";
