//! docker-registry - A CLI client for the Docker Registry HTTP API v2
//!
//! Lists repositories and tags, shows manifests, downloads blobs, and
//! deletes images or whole repositories, including a single tag whose
//! image is shared with other tags.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Listing, deletion and inspection workflows
//! - [`registry`] - Registry API abstraction, HTTP client and mock
//! - [`credentials`] - Credential lookup by registry host
//! - [`core`] - Addresses, digests and configuration
//! - [`ui`] - Output formatting
//!
//! # Invariants
//!
//! 1. Address arguments are validated before any network call
//! 2. Deleting one tag never removes the image from its sibling tags
//! 3. A tag whose manifest is missing never aborts a listing

pub mod cli;
pub mod core;
pub mod credentials;
pub mod engine;
pub mod registry;
pub mod ui;
