//! Wipe the cache directory.

use anyhow::{Context as _, Result};
use proxy_store::{CacheStore, DiskCache};
use tracing::info;

use super::ClearArgs;
use crate::context::Context;

/// Run the clear command.
pub async fn run(args: ClearArgs, ctx: &Context) -> Result<()> {
    let cache_dir = ctx.cache_dir(args.cache_dir.as_deref());
    info!(dir = %cache_dir.display(), "clearing cache");

    let store = DiskCache::open(&cache_dir)
        .with_context(|| format!("Failed to open cache at {}", cache_dir.display()))?;
    store
        .clear()
        .with_context(|| format!("Failed to clear cache at {}", cache_dir.display()))?;

    ctx.output.success(&format!("Cleared cache at {}", cache_dir.display()));
    Ok(())
}
