//! Caching proxy CLI.
//!
//! Commands:
//! - `caching-proxy serve` - Start the proxy in front of an origin
//! - `caching-proxy clear` - Wipe the cache directory and exit
//! - `caching-proxy config` - Inspect or create configuration

mod commands;
mod config;
mod context;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{ClearArgs, ConfigArgs, ServeArgs};

/// Caching reverse proxy - serve repeated requests from a disk cache
#[derive(Parser)]
#[command(name = "caching-proxy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the proxy server
    Serve(ServeArgs),

    /// Clear the cache and exit
    Clear(ClearArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    // Execute command
    let result = match cli.command {
        Commands::Serve(args) => commands::serve::run(args, &ctx).await,
        Commands::Clear(args) => commands::clear::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
