//! cli::commands::manifest
//!
//! Show the manifest of an image.

use std::io;

use anyhow::Result;

use super::connect;
use crate::core::address::Address;
use crate::core::types::ManifestSchema;
use crate::engine::inspect::{show_manifest, DEFAULT_TAG};
use crate::engine::Context;

/// Show the manifest of an image, `latest` unless a tag is given.
pub fn manifest(ctx: &Context, reference: &str, v1: bool) -> Result<()> {
    let address = Address::parse(reference)?;
    address.require_path()?;

    let schema = if v1 {
        ManifestSchema::V1
    } else {
        ManifestSchema::V2
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(manifest_async(ctx, &address, schema))
}

async fn manifest_async(ctx: &Context, address: &Address, schema: ManifestSchema) -> Result<()> {
    let registry = connect(ctx, address.server()).await?;
    let mut out = io::stdout().lock();
    show_manifest(
        registry.as_ref(),
        address.path(),
        address.tag_or(DEFAULT_TAG),
        schema,
        &mut out,
    )
    .await?;
    Ok(())
}
