//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates its address argument before any network call
//! 2. Connects to the registry with [`connect`]
//! 3. Runs the matching workflow from [`crate::engine`] against stdout
//!
//! # Async Commands
//!
//! Registry calls are async. Each handler is a sync function that builds
//! a tokio runtime and blocks on its async implementation.

mod blob;
mod completion;
mod ls;
mod manifest;
mod rm;

// Re-export command functions for testing and direct invocation
pub use blob::blob;
pub use completion::completion;
pub use ls::ls;
pub use manifest::manifest;
pub use rm::rm;

use anyhow::{Context as _, Result};

use super::args::Command;
use crate::core::config::Config;
use crate::credentials::create_store;
use crate::engine::Context;
use crate::registry::{create_registry, registry_url, Registry};
use crate::ui::output::{self, Verbosity};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Ls { reference, tags } => ls(ctx, &reference, tags),
        Command::Rm { reference } => rm(ctx, &reference),
        Command::Manifest { reference, v1 } => manifest(ctx, &reference, v1),
        Command::Blob { repository, digest } => blob(ctx, &repository, &digest),
        Command::Completion { shell } => completion(shell),
    }
}

/// Connect to the registry on `server`.
///
/// Loads the config, resolves the scheme and credentials for the host and
/// returns a client whose `/v2/` endpoint has answered.
pub async fn connect(ctx: &Context, server: &str) -> Result<Box<dyn Registry>> {
    let config = Config::load(ctx.config_path.as_deref()).context("failed to load config")?;

    let scheme = if ctx.insecure {
        "http"
    } else {
        config.scheme_for(server)
    };
    let url = registry_url(scheme, server);

    let store = create_store(config.credentials_provider())
        .context("failed to open credentials store")?;
    let credentials = store
        .get(server)
        .with_context(|| format!("failed to read credentials for {}", server))?;
    tracing::debug!(
        url = %url,
        config = ?config.loaded_from(),
        provider = store.name(),
        authenticated = credentials.is_some(),
        "connecting to registry"
    );
    if scheme == "http" && credentials.is_some() {
        output::warn(
            format!("sending credentials for {} over plain HTTP", server),
            Verbosity::from_flags(ctx.quiet, ctx.debug),
        );
    }

    create_registry(&url, credentials, Some(config.user_agent()))
        .await
        .with_context(|| format!("cannot connect to registry at {}", url))
}
