//! engine::inspect
//!
//! Manifest and blob display.

use std::io::Write;

use super::WorkflowError;
use crate::core::types::{Digest, ManifestSchema};
use crate::registry::{Registry, DIGEST_HEADER};

/// Tag used when a manifest reference has none.
pub const DEFAULT_TAG: &str = "latest";

/// Print the digest header line followed by the manifest body.
///
/// The registry's own digest is printed as-is; an empty value means the
/// registry did not send one.
pub async fn show_manifest(
    registry: &dyn Registry,
    name: &str,
    reference: &str,
    schema: ManifestSchema,
    out: &mut impl Write,
) -> Result<(), WorkflowError> {
    let raw = registry.manifest(name, reference, schema).await?;
    tracing::debug!(
        name,
        reference,
        media_type = raw.media_type.as_deref().unwrap_or_default(),
        "fetched manifest"
    );

    writeln!(
        out,
        "{}: {}",
        DIGEST_HEADER,
        raw.digest.as_deref().unwrap_or_default()
    )?;
    out.write_all(&raw.body)?;
    if !raw.body.ends_with(b"\n") {
        writeln!(out)?;
    }
    Ok(())
}

/// Download a blob, verify it against its digest and write the raw bytes.
pub async fn show_blob(
    registry: &dyn Registry,
    name: &str,
    digest: &Digest,
    out: &mut impl Write,
) -> Result<(), WorkflowError> {
    let content = registry.blob(name, digest).await?;
    tracing::debug!(name, digest = %digest, size = content.len(), "downloaded blob");

    if !digest.verify(&content) {
        return Err(WorkflowError::DigestMismatch(digest.clone()));
    }

    out.write_all(&content)?;
    out.flush()?;
    Ok(())
}
