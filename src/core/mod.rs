//! core
//!
//! Core domain types and configuration.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Digest, DigestAlgorithm, ManifestSchema
//! - [`address`] - `server/repository:tag` parsing
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - User input is validated before any network call

pub mod address;
pub mod config;
pub mod types;
