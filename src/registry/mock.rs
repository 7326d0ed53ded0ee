//! registry::mock
//!
//! Mock registry implementation for deterministic testing.
//!
//! # Design
//!
//! The mock keeps a small content-addressable store in memory: manifests
//! are keyed by the sha256 of their serialized bytes, tags are mutable
//! pointers to manifest digests, and blobs are keyed by their own digest.
//! Deleting a manifest removes every tag pointing at it, as a real
//! registry does. Failure scenarios can be configured per operation.
//!
//! # Example
//!
//! ```
//! use docker_registry::registry::mock::MockRegistry;
//! use docker_registry::registry::Registry;
//!
//! # tokio_test::block_on(async {
//! let registry = MockRegistry::new();
//! let digest = registry.push_image("app", &["v1", "latest"], b"{}", &[b"layer"]);
//!
//! assert_eq!(registry.manifest_digest("app", "latest").await.unwrap(), digest);
//! assert_eq!(registry.tags("app").await.unwrap(), vec!["latest", "v1"]);
//! # });
//! ```

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::manifest::{Descriptor, ImageManifest};
use super::traits::{RawManifest, Registry, RegistryError};
use super::{MEDIA_TYPE_IMAGE_CONFIG, MEDIA_TYPE_MANIFEST_V2};
use crate::core::types::{Digest, DigestAlgorithm, ManifestSchema};

/// Media type used for mock layers.
const MEDIA_TYPE_LAYER: &str = "application/vnd.docker.image.rootfs.diff.tar.gzip";

/// URL reported by the mock.
const MOCK_URL: &str = "mock://registry";

/// Mock registry for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockRegistry {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockRegistryInner>>,
}

/// One repository's manifests and tags.
#[derive(Debug, Default)]
struct MockRepository {
    /// Manifest bytes by digest.
    manifests: BTreeMap<Digest, Vec<u8>>,
    /// Tag to manifest digest.
    tags: BTreeMap<String, Digest>,
}

/// Internal mutable state.
#[derive(Debug, Default)]
struct MockRegistryInner {
    /// Repositories by name.
    repositories: BTreeMap<String, MockRepository>,
    /// Blob content by digest, shared across repositories.
    blobs: BTreeMap<Digest, Vec<u8>>,
    /// Accept manifest uploads without moving the tag.
    ignore_tag_updates: bool,
    /// Method to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail ping with the given error.
    Ping(RegistryError),
    /// Fail repositories with the given error.
    Repositories(RegistryError),
    /// Fail tags with the given error.
    Tags(RegistryError),
    /// Fail manifest fetches (GET) with the given error.
    Manifest(RegistryError),
    /// Fail manifest_digest (HEAD) for one tag with the given error.
    ManifestDigest { reference: String, error: RegistryError },
    /// Fail put_manifest with the given error.
    PutManifest(RegistryError),
    /// Fail delete_manifest with the given error.
    DeleteManifest(RegistryError),
    /// Fail blob with the given error.
    Blob(RegistryError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    Ping,
    Repositories,
    Tags {
        name: String,
    },
    Manifest {
        name: String,
        reference: String,
        schema: ManifestSchema,
    },
    ManifestDigest {
        name: String,
        reference: String,
    },
    PutManifest {
        name: String,
        reference: String,
    },
    DeleteManifest {
        name: String,
        digest: Digest,
    },
    Blob {
        name: String,
        digest: Digest,
    },
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRegistry {
    /// Create a new empty mock registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockRegistryInner::default())),
        }
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use docker_registry::registry::mock::{MockRegistry, FailOn};
    /// use docker_registry::registry::RegistryError;
    ///
    /// let registry = MockRegistry::new()
    ///     .fail_on(FailOn::Tags(RegistryError::NetworkError("down".into())));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.fail_on = Some(fail_on);
        }
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = None;
    }

    /// Accept manifest uploads but leave tags where they were.
    ///
    /// Models a registry that silently ignores tag overwrites.
    pub fn ignore_tag_updates(self) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.ignore_tag_updates = true;
        }
        self
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.clear();
    }

    /// Store a blob and return its digest.
    pub fn push_blob(&self, content: &[u8]) -> Digest {
        let digest = Digest::from_content(DigestAlgorithm::Sha256, content);
        let mut inner = self.inner.lock().unwrap();
        inner.blobs.insert(digest.clone(), content.to_vec());
        digest
    }

    /// Store a blob under an arbitrary digest, e.g. to simulate corruption.
    pub fn push_blob_as(&self, digest: &Digest, content: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        inner.blobs.insert(digest.clone(), content.to_vec());
    }

    /// Remove a blob, leaving manifests that reference it in place.
    pub fn remove_blob(&self, digest: &Digest) {
        let mut inner = self.inner.lock().unwrap();
        inner.blobs.remove(digest);
    }

    /// Push an image built from a config blob and layer blobs, and point
    /// every tag in `tags` at it.
    ///
    /// Returns the manifest digest.
    pub fn push_image(&self, name: &str, tags: &[&str], config: &[u8], layers: &[&[u8]]) -> Digest {
        let descriptor = |media_type: &str, content: &[u8]| Descriptor {
            media_type: media_type.to_string(),
            size: content.len() as u64,
            digest: self.push_blob(content),
        };

        let manifest = ImageManifest {
            schema_version: 2,
            media_type: Some(MEDIA_TYPE_MANIFEST_V2.to_string()),
            config: descriptor(MEDIA_TYPE_IMAGE_CONFIG, config),
            layers: layers
                .iter()
                .map(|layer| descriptor(MEDIA_TYPE_LAYER, layer))
                .collect(),
        };

        let digest = self.push_manifest(name, &manifest);
        for tag in tags {
            self.tag(name, tag, &digest);
        }
        digest
    }

    /// Store a manifest without tagging it. Returns its digest.
    pub fn push_manifest(&self, name: &str, manifest: &ImageManifest) -> Digest {
        let bytes = manifest.to_vec().unwrap();
        let digest = Digest::from_content(DigestAlgorithm::Sha256, &bytes);
        let mut inner = self.inner.lock().unwrap();
        inner
            .repositories
            .entry(name.to_string())
            .or_default()
            .manifests
            .insert(digest.clone(), bytes);
        digest
    }

    /// Point a tag at a digest.
    pub fn tag(&self, name: &str, tag: &str, digest: &Digest) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .repositories
            .entry(name.to_string())
            .or_default()
            .tags
            .insert(tag.to_string(), digest.clone());
    }

    /// Drop a manifest but keep the tags that point at it.
    ///
    /// Simulates a manifest deleted out-of-band: the tag still shows up in
    /// the tag list but resolving it fails with not-found.
    pub fn orphan_manifest(&self, name: &str, digest: &Digest) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(repo) = inner.repositories.get_mut(name) {
            repo.manifests.remove(digest);
        }
    }

    /// Resolve a tag to its digest, if the tag and its manifest exist.
    pub fn resolve(&self, name: &str, tag: &str) -> Option<Digest> {
        let inner = self.inner.lock().unwrap();
        let repo = inner.repositories.get(name)?;
        let digest = repo.tags.get(tag)?;
        repo.manifests.contains_key(digest).then(|| digest.clone())
    }

    /// Tags currently pointing at a digest, sorted.
    pub fn tags_of(&self, name: &str, digest: &Digest) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .repositories
            .get(name)
            .map(|repo| {
                repo.tags
                    .iter()
                    .filter(|(_, d)| *d == digest)
                    .map(|(t, _)| t.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether a manifest is stored under this digest.
    pub fn has_manifest(&self, name: &str, digest: &Digest) -> bool {
        let inner = self.inner.lock().unwrap();
        inner
            .repositories
            .get(name)
            .map(|repo| repo.manifests.contains_key(digest))
            .unwrap_or(false)
    }

    /// Number of manifests stored in a repository.
    pub fn manifest_count(&self, name: &str) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .repositories
            .get(name)
            .map(|repo| repo.manifests.len())
            .unwrap_or(0)
    }

    /// Record an operation and check for configured failure.
    fn record_and_check(
        &self,
        op: MockOperation,
        check: impl FnOnce(&FailOn) -> Option<RegistryError>,
    ) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(op);
        match inner.fail_on.as_ref().and_then(check) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn not_found(what: &str) -> RegistryError {
    RegistryError::NotFound(what.to_string())
}

#[async_trait]
impl Registry for MockRegistry {
    fn url(&self) -> &str {
        MOCK_URL
    }

    async fn ping(&self) -> Result<(), RegistryError> {
        self.record_and_check(MockOperation::Ping, |f| match f {
            FailOn::Ping(e) => Some(e.clone()),
            _ => None,
        })
    }

    async fn repositories(&self) -> Result<Vec<String>, RegistryError> {
        self.record_and_check(MockOperation::Repositories, |f| match f {
            FailOn::Repositories(e) => Some(e.clone()),
            _ => None,
        })?;

        let inner = self.inner.lock().unwrap();
        Ok(inner.repositories.keys().cloned().collect())
    }

    async fn tags(&self, name: &str) -> Result<Vec<String>, RegistryError> {
        self.record_and_check(
            MockOperation::Tags {
                name: name.to_string(),
            },
            |f| match f {
                FailOn::Tags(e) => Some(e.clone()),
                _ => None,
            },
        )?;

        let inner = self.inner.lock().unwrap();
        let repo = inner
            .repositories
            .get(name)
            .ok_or_else(|| not_found("NAME_UNKNOWN: repository name not known to registry"))?;
        Ok(repo.tags.keys().cloned().collect())
    }

    async fn manifest(
        &self,
        name: &str,
        reference: &str,
        schema: ManifestSchema,
    ) -> Result<RawManifest, RegistryError> {
        self.record_and_check(
            MockOperation::Manifest {
                name: name.to_string(),
                reference: reference.to_string(),
                schema,
            },
            |f| match f {
                FailOn::Manifest(e) => Some(e.clone()),
                _ => None,
            },
        )?;

        let inner = self.inner.lock().unwrap();
        let (digest, body) = lookup(&inner, name, reference)?;
        Ok(RawManifest {
            digest: Some(digest.to_string()),
            media_type: Some(schema.media_type().to_string()),
            body: body.to_vec(),
        })
    }

    async fn manifest_digest(&self, name: &str, reference: &str) -> Result<Digest, RegistryError> {
        self.record_and_check(
            MockOperation::ManifestDigest {
                name: name.to_string(),
                reference: reference.to_string(),
            },
            |f| match f {
                FailOn::ManifestDigest { reference: r, error } if r == reference => {
                    Some(error.clone())
                }
                _ => None,
            },
        )?;

        let inner = self.inner.lock().unwrap();
        lookup(&inner, name, reference).map(|(digest, _)| digest.clone())
    }

    async fn put_manifest(
        &self,
        name: &str,
        reference: &str,
        manifest: &ImageManifest,
    ) -> Result<Option<Digest>, RegistryError> {
        self.record_and_check(
            MockOperation::PutManifest {
                name: name.to_string(),
                reference: reference.to_string(),
            },
            |f| match f {
                FailOn::PutManifest(e) => Some(e.clone()),
                _ => None,
            },
        )?;

        let bytes = manifest.to_vec()?;
        let digest = Digest::from_content(DigestAlgorithm::Sha256, &bytes);

        let mut inner = self.inner.lock().unwrap();
        let ignore_tag_updates = inner.ignore_tag_updates;
        let repo = inner.repositories.entry(name.to_string()).or_default();
        repo.manifests.insert(digest.clone(), bytes);
        if Digest::new(reference).is_err() && !ignore_tag_updates {
            repo.tags.insert(reference.to_string(), digest.clone());
        }
        Ok(Some(digest))
    }

    async fn delete_manifest(&self, name: &str, digest: &Digest) -> Result<(), RegistryError> {
        self.record_and_check(
            MockOperation::DeleteManifest {
                name: name.to_string(),
                digest: digest.clone(),
            },
            |f| match f {
                FailOn::DeleteManifest(e) => Some(e.clone()),
                _ => None,
            },
        )?;

        let mut inner = self.inner.lock().unwrap();
        let repo = inner
            .repositories
            .get_mut(name)
            .ok_or_else(|| not_found("NAME_UNKNOWN: repository name not known to registry"))?;
        if repo.manifests.remove(digest).is_none() {
            return Err(not_found("MANIFEST_UNKNOWN: manifest unknown"));
        }
        repo.tags.retain(|_, d| d != digest);
        Ok(())
    }

    async fn blob(&self, name: &str, digest: &Digest) -> Result<Vec<u8>, RegistryError> {
        self.record_and_check(
            MockOperation::Blob {
                name: name.to_string(),
                digest: digest.clone(),
            },
            |f| match f {
                FailOn::Blob(e) => Some(e.clone()),
                _ => None,
            },
        )?;

        let inner = self.inner.lock().unwrap();
        inner
            .blobs
            .get(digest)
            .cloned()
            .ok_or_else(|| not_found("BLOB_UNKNOWN: blob unknown to registry"))
    }
}

/// Resolve a tag or digest reference to a stored manifest.
fn lookup<'a>(
    inner: &'a MockRegistryInner,
    name: &str,
    reference: &str,
) -> Result<(&'a Digest, &'a [u8]), RegistryError> {
    let repo = inner
        .repositories
        .get(name)
        .ok_or_else(|| not_found("NAME_UNKNOWN: repository name not known to registry"))?;

    let digest = match repo.tags.get(reference) {
        Some(digest) => digest.clone(),
        None => Digest::new(reference).map_err(|_| not_found("MANIFEST_UNKNOWN: manifest unknown"))?,
    };

    repo.manifests
        .get_key_value(&digest)
        .map(|(d, body)| (d, body.as_slice()))
        .ok_or_else(|| not_found("MANIFEST_UNKNOWN: manifest unknown"))
}
