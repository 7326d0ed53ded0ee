//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--insecure`: Use plain HTTP
//! - `--config <path>`: Use a specific config file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docker-registry - List, inspect and delete images in a Docker Registry v2
#[derive(Parser, Debug)]
#[command(name = "docker-registry")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; suppresses deletion confirmations
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Talk plain HTTP to the registry
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Path to the config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List repositories or images in the registry
    #[command(
        name = "ls",
        long_about = "List repositories or images in the registry.\n\n\
            With only a server, prints every repository in the catalog. With a \
            repository, prints a table of its tags with image id, size and creation \
            time. A tag narrows the table to that one image.",
        after_help = "\
EXAMPLES:
    # list all repositories of the registry
    docker-registry ls registry.example.com

    # list all images of the repository
    docker-registry ls registry.example.com/my/repo

    # list one image of the repository
    docker-registry ls registry.example.com/my/repo:my-tag

    # list only tag names
    docker-registry ls -t registry.example.com/my/repo"
    )]
    Ls {
        /// SERVER[/REPOSITORY[:TAG]]
        #[arg(value_name = "REPOSITORY")]
        reference: String,

        /// List only tags
        #[arg(short, long)]
        tags: bool,
    },

    /// Delete repositories or images in the registry
    #[command(
        name = "rm",
        long_about = "Delete repositories or images in the registry.\n\n\
            Deleting a tag that shares its image with other tags removes only that \
            tag; the other tags keep the image. Deleting a repository or the whole \
            registry deletes every image, one digest at a time.\n\n\
            The registry must have deletion enabled.",
        after_help = "\
EXAMPLES:
    # delete one image from the repository
    docker-registry rm registry.example.com/my/repo:my-tag

    # delete one repository from the registry
    docker-registry rm registry.example.com/my/repo

    # delete all repositories from the registry
    docker-registry rm registry.example.com"
    )]
    Rm {
        /// SERVER[/REPOSITORY[:TAG]]
        #[arg(value_name = "REPOSITORY[:TAG]")]
        reference: String,
    },

    /// Show the manifest of an image in the registry
    #[command(
        name = "manifest",
        long_about = "Show the manifest of an image in the registry.\n\n\
            Prints the Docker-Content-Digest reported by the registry, then the \
            manifest body. The tag defaults to \"latest\".",
        after_help = "\
EXAMPLES:
    docker-registry manifest registry.example.com/my/repo:my-tag

    # use the default \"latest\" tag
    docker-registry manifest registry.example.com/my/repo

    # request the schema1 form
    docker-registry manifest --v1 registry.example.com/my/repo:my-tag"
    )]
    Manifest {
        /// SERVER/REPOSITORY[:TAG]
        #[arg(value_name = "REPOSITORY[:TAG]")]
        reference: String,

        /// Show the manifest in v1 format, default to v2
        #[arg(long)]
        v1: bool,
    },

    /// Display blob content of a repository in the registry
    #[command(
        name = "blob",
        long_about = "Display blob content of a repository in the registry.\n\n\
            The raw bytes are written to stdout; redirect the output for binary \
            blobs. The content is checked against the digest before it is written.",
        after_help = "\
EXAMPLES:
    docker-registry blob registry.example.com/my/repo sha256:2ca708c1c9ccc509b070f226d6e4712604e0c48b55d7d8f5adc9be4a4d36029a

    # save a layer
    docker-registry blob registry.example.com/my/repo sha256:... > layer.tar.gz"
    )]
    Blob {
        /// SERVER/REPOSITORY
        #[arg(value_name = "REPOSITORY")]
        repository: String,

        /// Blob digest, e.g. sha256:<hex>
        digest: String,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash
    docker-registry completion bash > /etc/bash_completion.d/docker-registry

    # Zsh
    docker-registry completion zsh > \"${fpath[1]}/_docker-registry\"

    # Fish
    docker-registry completion fish > ~/.config/fish/completions/docker-registry.fish

    # PowerShell
    docker-registry completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
