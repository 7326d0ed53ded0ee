//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Digest`] - Validated content digest (`algorithm:encoded`)
//! - [`DigestAlgorithm`] - Registered digest algorithms
//! - [`ManifestSchema`] - Manifest media type requested from the registry
//!
//! # Validation
//!
//! These types enforce validity at construction time. A `Digest` that
//! exists has a known algorithm and a correctly sized hex payload.
//!
//! # Examples
//!
//! ```
//! use docker_registry::core::types::Digest;
//!
//! let digest = Digest::new(
//!     "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
//! )
//! .unwrap();
//! assert_eq!(digest.short_id(), "e3b0c44298fc");
//!
//! assert!(Digest::new("sha256:not-hex").is_err());
//! assert!(Digest::new("latest").is_err());
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256, Sha384, Sha512};
use thiserror::Error;

/// Number of encoded characters shown as an image id.
pub const SHORT_ID_LEN: usize = 12;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid digest '{digest}': {reason}")]
    InvalidDigest { digest: String, reason: String },

    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

impl TypeError {
    fn invalid(digest: &str, reason: impl Into<String>) -> Self {
        TypeError::InvalidDigest {
            digest: digest.to_string(),
            reason: reason.into(),
        }
    }
}

/// Registered digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DigestAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// Parse an algorithm identifier.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        match s {
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha384" => Ok(DigestAlgorithm::Sha384),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            other => Err(TypeError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    /// The algorithm identifier as it appears in a digest string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha384 => "sha384",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }

    /// Length of the hex encoded hash.
    pub fn encoded_len(&self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => 64,
            DigestAlgorithm::Sha384 => 96,
            DigestAlgorithm::Sha512 => 128,
        }
    }

    /// Hash `content` and return the lowercase hex encoding.
    pub fn hash_hex(&self, content: &[u8]) -> String {
        match self {
            DigestAlgorithm::Sha256 => hex::encode(Sha256::digest(content)),
            DigestAlgorithm::Sha384 => hex::encode(Sha384::digest(content)),
            DigestAlgorithm::Sha512 => hex::encode(Sha512::digest(content)),
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated content digest such as `sha256:<64 hex chars>`.
///
/// The grammar follows the OCI image spec: the algorithm is made of
/// `[a-z0-9]+` components joined by one of `+._-`, the encoded part is
/// `[a-zA-Z0-9=_-]+`. Only registered algorithms are accepted, and their
/// encoded part must be lowercase hex of the algorithm's length.
///
/// # Example
///
/// ```
/// use docker_registry::core::types::{Digest, DigestAlgorithm};
///
/// let d = Digest::from_content(DigestAlgorithm::Sha256, b"");
/// assert_eq!(
///     d.as_str(),
///     "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// assert!(d.verify(b""));
/// assert!(!d.verify(b"x"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Create a new validated digest.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidDigest` for malformed strings and
    /// `TypeError::UnsupportedAlgorithm` for unregistered algorithms.
    pub fn new(digest: impl Into<String>) -> Result<Self, TypeError> {
        let digest = digest.into();
        Self::validate(&digest)?;
        Ok(Self(digest))
    }

    /// Compute the digest of `content`.
    pub fn from_content(algorithm: DigestAlgorithm, content: &[u8]) -> Self {
        Self(format!("{}:{}", algorithm, algorithm.hash_hex(content)))
    }

    fn validate(digest: &str) -> Result<(), TypeError> {
        let (algorithm, encoded) = digest
            .split_once(':')
            .ok_or_else(|| TypeError::invalid(digest, "missing ':' separator"))?;

        if algorithm.is_empty() {
            return Err(TypeError::invalid(digest, "empty algorithm"));
        }
        let algorithm_ok = algorithm
            .split(['+', '.', '_', '-'])
            .all(|c| !c.is_empty() && c.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
        if !algorithm_ok {
            return Err(TypeError::invalid(digest, "malformed algorithm"));
        }

        if encoded.is_empty() {
            return Err(TypeError::invalid(digest, "empty encoded part"));
        }
        let encoded_ok = encoded
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'=' | b'_' | b'-'));
        if !encoded_ok {
            return Err(TypeError::invalid(digest, "malformed encoded part"));
        }

        let algorithm = DigestAlgorithm::parse(algorithm)?;
        if encoded.len() != algorithm.encoded_len() {
            return Err(TypeError::invalid(
                digest,
                format!(
                    "{} digest must have {} hex characters, got {}",
                    algorithm,
                    algorithm.encoded_len(),
                    encoded.len()
                ),
            ));
        }
        if !encoded
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(TypeError::invalid(digest, "encoded part must be lowercase hex"));
        }

        Ok(())
    }

    /// Get the digest as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The algorithm part.
    pub fn algorithm(&self) -> DigestAlgorithm {
        // Validated at construction.
        let (algorithm, _) = self.0.split_once(':').unwrap_or_default();
        DigestAlgorithm::parse(algorithm).unwrap_or(DigestAlgorithm::Sha256)
    }

    /// The encoded (hex) part.
    pub fn encoded(&self) -> &str {
        self.0.split_once(':').map(|(_, e)| e).unwrap_or_default()
    }

    /// Short image id: the first 12 encoded characters.
    pub fn short_id(&self) -> &str {
        &self.encoded()[..SHORT_ID_LEN]
    }

    /// Check that `content` hashes to this digest.
    pub fn verify(&self, content: &[u8]) -> bool {
        self.algorithm().hash_hex(content) == self.encoded()
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Digest {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Digest {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Digest> for String {
    fn from(d: Digest) -> String {
        d.0
    }
}

/// Derive a short image id from any digest-like string.
///
/// Returns the first 12 characters after the algorithm prefix. Strings
/// without a `:` are returned unchanged; shorter payloads are returned whole.
///
/// ```
/// use docker_registry::core::types::image_id;
///
/// assert_eq!(image_id("sha256:deadbeef0123456789"), "deadbeef0123");
/// assert_eq!(image_id("abc"), "abc");
/// ```
pub fn image_id(digest: &str) -> &str {
    match digest.split_once(':') {
        Some((_, encoded)) => match encoded.char_indices().nth(SHORT_ID_LEN) {
            Some((end, _)) => &encoded[..end],
            None => encoded,
        },
        None => digest,
    }
}

/// Schema version of the manifest requested from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifestSchema {
    /// Image manifest v2, schema 1.
    V1,
    /// Image manifest v2, schema 2.
    #[default]
    V2,
}

impl ManifestSchema {
    /// The media type sent in the `Accept` header.
    pub fn media_type(&self) -> &'static str {
        match self {
            ManifestSchema::V1 => crate::registry::MEDIA_TYPE_MANIFEST_V1,
            ManifestSchema::V2 => crate::registry::MEDIA_TYPE_MANIFEST_V2,
        }
    }
}
