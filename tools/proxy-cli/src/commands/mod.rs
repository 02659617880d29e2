//! CLI command implementations.

pub mod clear;
pub mod config;
pub mod serve;

use clap::{Args, Subcommand};

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Origin server URL to forward to.
    #[arg(short, long)]
    pub origin: Option<String>,

    /// Host to bind (default: localhost).
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (default: 8080).
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Cache directory (default: ./tmp/cache).
    #[arg(long)]
    pub cache_dir: Option<String>,
}

/// Arguments for the clear command.
#[derive(Args)]
pub struct ClearArgs {
    /// Cache directory (default: ./tmp/cache).
    #[arg(long)]
    pub cache_dir: Option<String>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration.
    Show,

    /// Write a default caching-proxy.toml to the working directory.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}
