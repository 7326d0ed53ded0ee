//! cli::commands::blob
//!
//! Write a blob to stdout.

use std::io;

use anyhow::{Context as _, Result};

use super::connect;
use crate::core::address::Address;
use crate::core::types::Digest;
use crate::engine::inspect::show_blob;
use crate::engine::Context;

/// Display blob content of a repository.
///
/// The repository and digest are both validated before connecting.
pub fn blob(ctx: &Context, repository: &str, digest: &str) -> Result<()> {
    let address = Address::parse(repository)?;
    address.require_path()?;
    let digest = Digest::new(digest).with_context(|| format!("invalid digest '{}'", digest))?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(blob_async(ctx, &address, &digest))
}

async fn blob_async(ctx: &Context, address: &Address, digest: &Digest) -> Result<()> {
    let registry = connect(ctx, address.server()).await?;
    let mut out = io::stdout().lock();
    show_blob(registry.as_ref(), address.path(), digest, &mut out).await?;
    Ok(())
}
