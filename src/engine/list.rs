//! engine::list
//!
//! Catalog, tag and image listings.
//!
//! The extended image listing looks like:
//!
//! ```text
//! TAG      IMAGE ID        SIZE      CREATED
//! latest   a3ed95caeb02    2.7MB     2024-03-01T13:30:45+01:00
//! old      *** Not Found ***
//! ```
//!
//! A tag whose manifest has disappeared gets a `*** Not Found ***` row and
//! the listing continues. A missing config blob shows `-` as the creation
//! time.

use std::io::Write;

use super::WorkflowError;
use crate::core::types::{image_id, Digest};
use crate::registry::{ImageConfig, Registry};
use crate::ui::output::{column_width, format_created, format_size};

/// Extra spacing after the tag column.
const TAG_PADDING: usize = 3;

/// Minimum tag column width, before padding.
const MIN_TAG_WIDTH: usize = 5;

/// Width of the `IMAGE ID` column.
const ID_WIDTH: usize = 15;

/// Width of the `SIZE` column.
const SIZE_WIDTH: usize = 10;

/// Row shown for a tag whose manifest is missing.
pub const NOT_FOUND_ROW: &str = "*** Not Found ***";

/// Print every repository in the catalog, one per line.
pub async fn list_repositories(
    registry: &dyn Registry,
    out: &mut impl Write,
) -> Result<(), WorkflowError> {
    for name in registry.repositories().await? {
        writeln!(out, "{}", name)?;
    }
    Ok(())
}

/// Print `TAG` followed by tag names.
///
/// With `tag` set, only that tag is printed, without asking the registry.
pub async fn list_tags(
    registry: &dyn Registry,
    name: &str,
    tag: Option<&str>,
    out: &mut impl Write,
) -> Result<(), WorkflowError> {
    let tags = resolve_tags(registry, name, tag).await?;
    writeln!(out, "TAG")?;
    for tag in &tags {
        writeln!(out, "{}", tag)?;
    }
    Ok(())
}

/// Print the extended image table for a repository.
///
/// With `tag` set, only that tag is listed.
pub async fn list_images(
    registry: &dyn Registry,
    name: &str,
    tag: Option<&str>,
    out: &mut impl Write,
) -> Result<(), WorkflowError> {
    let tags = resolve_tags(registry, name, tag).await?;
    let width = column_width(&tags, MIN_TAG_WIDTH) + TAG_PADDING;

    writeln!(
        out,
        "{:<width$}{:<id_width$} {:<size_width$}{}",
        "TAG",
        "IMAGE ID",
        "SIZE",
        "CREATED",
        id_width = ID_WIDTH,
        size_width = SIZE_WIDTH,
    )?;

    for tag in &tags {
        let manifest = match registry.manifest_v2(name, tag).await {
            Ok(manifest) => manifest,
            Err(e) if e.is_not_found() => {
                tracing::debug!(name, tag = %tag, "manifest not found");
                writeln!(out, "{:<width$}{}", tag, NOT_FOUND_ROW)?;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let created = created_time(registry, name, &manifest.config.digest).await?;
        writeln!(
            out,
            "{:<width$}{:<id_width$} {:<size_width$}{}",
            tag,
            image_id(manifest.config.digest.as_str()),
            format_size(manifest.total_size()),
            created,
            id_width = ID_WIDTH,
            size_width = SIZE_WIDTH,
        )?;
    }

    Ok(())
}

async fn resolve_tags(
    registry: &dyn Registry,
    name: &str,
    tag: Option<&str>,
) -> Result<Vec<String>, WorkflowError> {
    match tag {
        Some(tag) => Ok(vec![tag.to_string()]),
        None => Ok(registry.tags(name).await?),
    }
}

/// Creation time from the image config blob, or `-` when unknown.
async fn created_time(
    registry: &dyn Registry,
    name: &str,
    config: &Digest,
) -> Result<String, WorkflowError> {
    let body = match registry.blob(name, config).await {
        Ok(body) => body,
        Err(e) if e.is_not_found() => {
            tracing::debug!(name, digest = %config, "config blob not found");
            return Ok("-".to_string());
        }
        Err(e) => return Err(e.into()),
    };

    let config = ImageConfig::from_slice(&body)?;
    Ok(config
        .created
        .as_ref()
        .map(format_created)
        .unwrap_or_else(|| "-".to_string()))
}
