//! engine::index
//!
//! Tag/digest index of one repository.
//!
//! The registry API has no call that maps a digest to its tags, so the
//! index is built by resolving every tag with a `HEAD` request. Tags whose
//! manifest is gone are left out; any other failure aborts the build.

use std::collections::BTreeMap;

use crate::core::types::Digest;
use crate::registry::{Registry, RegistryError};

/// Bidirectional tag/digest index. Tag lists are kept sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagIndex {
    by_digest: BTreeMap<Digest, Vec<String>>,
    by_tag: BTreeMap<String, Digest>,
}

/// A set of tags sharing one digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagGroup<'a> {
    pub digest: &'a Digest,
    pub tags: &'a [String],
}

impl TagGroup<'_> {
    /// Tags joined with `", "`, the form used for display and ordering.
    pub fn joined(&self) -> String {
        self.tags.join(", ")
    }
}

impl TagIndex {
    /// Resolve every tag of a repository.
    ///
    /// # Errors
    ///
    /// Fails if the tag list cannot be fetched or a tag lookup fails with
    /// anything other than not-found.
    pub async fn build(registry: &dyn Registry, name: &str) -> Result<Self, RegistryError> {
        let tags = registry.tags(name).await?;
        let mut index = Self::default();

        for tag in tags {
            match registry.manifest_digest(name, &tag).await {
                Ok(digest) => index.insert(tag, digest),
                Err(e) if e.is_not_found() => {
                    tracing::debug!(name, tag = %tag, "skipping tag without manifest");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::debug!(
            name,
            tags = index.by_tag.len(),
            digests = index.by_digest.len(),
            "built tag index"
        );
        Ok(index)
    }

    /// Point a tag at a digest, moving it out of its previous group.
    pub fn insert(&mut self, tag: impl Into<String>, digest: Digest) {
        let tag = tag.into();

        if let Some(previous) = self.by_tag.insert(tag.clone(), digest.clone()) {
            if let Some(tags) = self.by_digest.get_mut(&previous) {
                tags.retain(|t| *t != tag);
                if tags.is_empty() {
                    self.by_digest.remove(&previous);
                }
            }
        }

        let tags = self.by_digest.entry(digest).or_default();
        if let Err(pos) = tags.binary_search(&tag) {
            tags.insert(pos, tag);
        }
    }

    /// Digest a tag resolves to.
    pub fn digest_of(&self, tag: &str) -> Option<&Digest> {
        self.by_tag.get(tag)
    }

    /// Tags pointing at a digest, sorted.
    pub fn tags_of(&self, digest: &Digest) -> &[String] {
        self.by_digest.get(digest).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Other tags sharing the digest of `tag`.
    pub fn siblings(&self, tag: &str) -> Vec<&str> {
        self.digest_of(tag)
            .map(|digest| {
                self.tags_of(digest)
                    .iter()
                    .map(String::as_str)
                    .filter(|t| *t != tag)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Digest groups ordered by their joined tag list.
    pub fn groups(&self) -> Vec<TagGroup<'_>> {
        let mut groups: Vec<TagGroup<'_>> = self
            .by_digest
            .iter()
            .map(|(digest, tags)| TagGroup {
                digest,
                tags: tags.as_slice(),
            })
            .collect();
        groups.sort_by_cached_key(TagGroup::joined);
        groups
    }

    /// Number of distinct digests.
    pub fn digest_count(&self) -> usize {
        self.by_digest.len()
    }

    /// Number of resolved tags.
    pub fn tag_count(&self) -> usize {
        self.by_tag.len()
    }
}
