//! cli::commands::ls
//!
//! List repositories, tags or images.
//!
//! - `ls SERVER`: every repository in the catalog
//! - `ls SERVER/REPO`: image table of all tags
//! - `ls SERVER/REPO:TAG`: image table of one tag
//! - `-t`: tag names only

use std::io;

use anyhow::Result;

use super::connect;
use crate::core::address::Address;
use crate::engine::list::{list_images, list_repositories, list_tags};
use crate::engine::Context;

/// List repositories or images in the registry.
pub fn ls(ctx: &Context, reference: &str, tags_only: bool) -> Result<()> {
    let address = Address::parse(reference)?;
    address.require_server()?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(ls_async(ctx, &address, tags_only))
}

async fn ls_async(ctx: &Context, address: &Address, tags_only: bool) -> Result<()> {
    let registry = connect(ctx, address.server()).await?;
    let mut out = io::stdout().lock();

    if address.path().is_empty() {
        list_repositories(registry.as_ref(), &mut out).await?;
        return Ok(());
    }

    let tag = Some(address.tag()).filter(|t| !t.is_empty());
    if tags_only {
        list_tags(registry.as_ref(), address.path(), tag, &mut out).await?;
    } else {
        list_images(registry.as_ref(), address.path(), tag, &mut out).await?;
    }
    Ok(())
}
