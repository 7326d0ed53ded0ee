//! core::address
//!
//! Parsing of user supplied `server/repository:tag` addresses.
//!
//! # Design
//!
//! Splitting is first-match: the server ends at the first `/`, the tag
//! starts after the first `:` of the repository path. An omitted segment is
//! kept as an empty string and each command decides which parts it requires
//! through the `require_*` helpers. A separator followed by nothing
//! (`host/`, `host/repo:`) is rejected at parse time, so it can never widen
//! into a repository or registry wide operation.
//!
//! # Example
//!
//! ```
//! use docker_registry::core::address::Address;
//!
//! let addr = Address::parse("registry.example.com/my/repo:v1").unwrap();
//! assert_eq!(addr.server(), "registry.example.com");
//! assert_eq!(addr.path(), "my/repo");
//! assert_eq!(addr.tag(), "v1");
//! ```

use thiserror::Error;

/// Errors from address parsing and validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("repository can't be empty")]
    Empty,

    #[error("registry server is required in '{0}'")]
    MissingServer(String),

    #[error("repository path is required in '{0}'")]
    MissingPath(String),

    #[error("tag is empty in '{0}'")]
    MissingTag(String),
}

/// A parsed `server/path:tag` address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    raw: String,
    server: String,
    path: String,
    tag: String,
}

impl Address {
    /// Parse an address.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Empty` if the input is empty,
    /// `AddressError::MissingPath` if a `/` is followed by no repository
    /// path and `AddressError::MissingTag` if a `:` is followed by no tag.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        if input.is_empty() {
            return Err(AddressError::Empty);
        }
        let (server, name) = split_server_and_name(input);
        let (path, tag) = split_name_and_tag(name);
        if input.contains('/') && path.is_empty() {
            return Err(AddressError::MissingPath(input.to_string()));
        }
        if name.contains(':') && tag.is_empty() {
            return Err(AddressError::MissingTag(input.to_string()));
        }
        Ok(Self {
            raw: input.to_string(),
            server: server.to_string(),
            path: path.to_string(),
            tag: tag.to_string(),
        })
    }

    /// Registry host (may include a port).
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Repository path; empty when only a server was given.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Tag; empty when none was given.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The tag, or `default` when none was given.
    pub fn tag_or<'a>(&'a self, default: &'a str) -> &'a str {
        if self.tag.is_empty() {
            default
        } else {
            &self.tag
        }
    }

    /// Fail unless a server is present.
    pub fn require_server(&self) -> Result<&str, AddressError> {
        if self.server.is_empty() {
            Err(AddressError::MissingServer(self.raw.clone()))
        } else {
            Ok(&self.server)
        }
    }

    /// Fail unless both server and repository path are present.
    pub fn require_path(&self) -> Result<&str, AddressError> {
        self.require_server()?;
        if self.path.is_empty() {
            Err(AddressError::MissingPath(self.raw.clone()))
        } else {
            Ok(&self.path)
        }
    }
}

/// Split at the first `/` into `(server, name)`.
///
/// Without a `/` the whole input is the server and the name is empty.
pub fn split_server_and_name(input: &str) -> (&str, &str) {
    input.split_once('/').unwrap_or((input, ""))
}

/// Split at the first `:` into `(name, tag)`.
///
/// Without a `:` the tag is empty.
pub fn split_name_and_tag(name: &str) -> (&str, &str) {
    name.split_once(':').unwrap_or((name, ""))
}
