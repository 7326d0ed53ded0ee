//! engine
//!
//! Registry workflows: listing, deletion and inspection.
//!
//! # Architecture
//!
//! Each workflow takes a `&dyn Registry` and an output sink, so the same
//! code runs against `HttpRegistry` in production and `MockRegistry` in
//! tests. Workflows issue one request at a time and stop at the first
//! error that is not a tolerated not-found.
//!
//! - [`index`]: tag/digest index of one repository
//! - [`list`]: catalog, tag and image listings
//! - [`delete`]: image, repository and registry-wide deletion
//! - [`inspect`]: manifest and blob display

pub mod delete;
pub mod index;
pub mod inspect;
pub mod list;

use std::path::PathBuf;

use thiserror::Error;

use crate::core::types::Digest;
use crate::registry::RegistryError;

pub use index::TagIndex;

/// Execution context shared by all commands.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Talk plain HTTP to the registry.
    pub insecure: bool,
    /// Config file override.
    pub config_path: Option<PathBuf>,
}

/// Errors from registry workflows.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A registry call failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The tag does not resolve to any manifest.
    #[error("tag not found: {name}:{tag}")]
    TagNotFound { name: String, tag: String },

    /// Overwriting a tag did not move it to a new digest.
    #[error("digest of {name}:{tag} is still {digest} after overwriting the tag")]
    DigestUnchanged {
        name: String,
        tag: String,
        digest: Digest,
    },

    /// Downloaded content does not hash to the requested digest.
    #[error("content of blob {0} does not match its digest")]
    DigestMismatch(Digest),

    /// Writing output failed.
    #[error("cannot write output: {0}")]
    Output(#[from] std::io::Error),
}
