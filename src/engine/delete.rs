//! engine::delete
//!
//! Image, repository and registry-wide deletion.
//!
//! # Shared digests
//!
//! The registry deletes manifests, not tags, and deleting a manifest drops
//! every tag pointing at it. To delete one tag whose digest is shared with
//! other tags, the tag is first overwritten with a placeholder manifest
//! (same config, no layers). That moves it to a digest of its own, which
//! is then deleted. The siblings keep the original digest.
//!
//! If the registry accepts the upload but the tag still resolves to the
//! original digest, the workflow stops with
//! [`WorkflowError::DigestUnchanged`] rather than delete the shared manifest.

use std::io::Write;

use super::index::TagIndex;
use super::WorkflowError;
use crate::core::types::Digest;
use crate::registry::Registry;
use crate::ui::output::column_width;

/// Repository column width for single-repository deletion.
pub const DEFAULT_NAME_WIDTH: usize = 10;

/// Minimum repository column width for registry-wide deletion.
const MIN_NAME_WIDTH: usize = 8;

/// Extra spacing after the repository column.
const NAME_PADDING: usize = 3;

/// Delete one tag of a repository.
///
/// # Errors
///
/// - `TagNotFound` if the tag does not resolve
/// - `DigestUnchanged` if the tag could not be moved off a shared digest
/// - Any registry error along the way
pub async fn delete_image(
    registry: &dyn Registry,
    name: &str,
    tag: &str,
    out: &mut impl Write,
) -> Result<(), WorkflowError> {
    let index = TagIndex::build(registry, name).await?;
    let digest = index
        .digest_of(tag)
        .cloned()
        .ok_or_else(|| WorkflowError::TagNotFound {
            name: name.to_string(),
            tag: tag.to_string(),
        })?;

    let siblings = index.siblings(tag);
    let target = if siblings.is_empty() {
        digest
    } else {
        tracing::info!(name, tag, siblings = ?siblings, "tag shares its digest, moving it first");
        move_tag(registry, name, tag, &digest).await?
    };

    registry.delete_manifest(name, &target).await?;
    writeln!(out, "deleted {}/{} tags: {}", registry.url(), name, tag)?;
    Ok(())
}

/// Overwrite a tag with a placeholder manifest and return its new digest.
async fn move_tag(
    registry: &dyn Registry,
    name: &str,
    tag: &str,
    digest: &Digest,
) -> Result<Digest, WorkflowError> {
    let manifest = registry.manifest_v2(name, tag).await?;
    let uploaded = registry
        .put_manifest(name, tag, &manifest.placeholder())
        .await?;

    let moved = registry.manifest_digest(name, tag).await?;
    if let Some(uploaded) = uploaded.as_ref().filter(|d| **d != moved) {
        tracing::warn!(name, tag, uploaded = %uploaded, resolved = %moved, "upload digest differs from tag digest");
    }
    if moved == *digest {
        return Err(WorkflowError::DigestUnchanged {
            name: name.to_string(),
            tag: tag.to_string(),
            digest: moved,
        });
    }

    tracing::debug!(name, tag, from = %digest, to = %moved, "moved tag");
    Ok(moved)
}

/// Delete every image of a repository, one digest group at a time.
///
/// Groups are processed in order of their joined tag lists. `width` pads
/// the repository name in the output and defaults to
/// [`DEFAULT_NAME_WIDTH`].
pub async fn delete_repository(
    registry: &dyn Registry,
    name: &str,
    width: Option<usize>,
    out: &mut impl Write,
) -> Result<(), WorkflowError> {
    let width = width.unwrap_or(DEFAULT_NAME_WIDTH);
    let index = TagIndex::build(registry, name).await?;

    for group in index.groups() {
        registry.delete_manifest(name, group.digest).await?;
        writeln!(
            out,
            "deleted {}/{:<width$} tags: {}",
            registry.url(),
            name,
            group.joined()
        )?;
    }
    Ok(())
}

/// Delete every repository in the catalog.
pub async fn delete_all_repositories(
    registry: &dyn Registry,
    out: &mut impl Write,
) -> Result<(), WorkflowError> {
    let repositories = registry.repositories().await?;
    let width = column_width(&repositories, MIN_NAME_WIDTH) + NAME_PADDING;

    for name in &repositories {
        delete_repository(registry, name, Some(width), out).await?;
    }
    Ok(())
}
