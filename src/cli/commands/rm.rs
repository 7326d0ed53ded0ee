//! cli::commands::rm
//!
//! Delete images, a repository, or every repository of a registry.
//!
//! - `rm SERVER/REPO:TAG`: one image; sibling tags keep the image
//! - `rm SERVER/REPO`: every image of the repository
//! - `rm SERVER`: every repository in the catalog

use anyhow::Result;

use super::connect;
use crate::core::address::Address;
use crate::engine::delete::{delete_all_repositories, delete_image, delete_repository};
use crate::engine::Context;
use crate::ui::output::{self, Verbosity};

/// Delete repository or images in the registry.
pub fn rm(ctx: &Context, reference: &str) -> Result<()> {
    let address = Address::parse(reference)?;
    address.require_server()?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(rm_async(ctx, &address))
}

async fn rm_async(ctx: &Context, address: &Address) -> Result<()> {
    let registry = connect(ctx, address.server()).await?;
    let mut out = output::messages(Verbosity::from_flags(ctx.quiet, ctx.debug));

    match (address.path(), address.tag()) {
        ("", _) => delete_all_repositories(registry.as_ref(), &mut out).await?,
        (name, "") => delete_repository(registry.as_ref(), name, None, &mut out).await?,
        (name, tag) => delete_image(registry.as_ref(), name, tag, &mut out).await?,
    }
    Ok(())
}
