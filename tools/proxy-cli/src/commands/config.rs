//! Configuration management.

use anyhow::{bail, Context as _, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CONFIG_FILE_NAMES};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Effective configuration");
    ctx.output.raw(&ctx.config.to_toml()?);
    if ctx.output.is_verbose() {
        ctx.output.kv("Working directory", &ctx.cwd.display().to_string());
        ctx.output.kv("Resolved cache", &ctx.cache_dir(None).display().to_string());
    }
    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let path = ctx.cwd.join(CONFIG_FILE_NAMES[0]);

    if path.exists() {
        if !force {
            bail!("{} already exists (use --force to overwrite)", path.display());
        }
        ctx.output.warn(&format!("Overwriting {}", path.display()));
    }

    std::fs::write(&path, generate_default_config())
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    ctx.output.success(&format!("Wrote {}", path.display()));
    Ok(())
}
