//! cli
//!
//! Command-line interface layer for docker-registry.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! the workflows in [`crate::engine`], which do the registry work.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::engine;
use anyhow::Result;

/// Run the CLI application on already parsed arguments.
///
/// This is the main entry point called from `main.rs`, which parses first
/// so logging can be set up from the global flags.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = engine::Context {
        debug: cli.debug,
        quiet: cli.quiet,
        insecure: cli.insecure,
        config_path: cli.config.clone(),
    };

    commands::dispatch(cli.command, &ctx)
}
