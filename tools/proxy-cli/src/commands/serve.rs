//! Run the proxy server.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use proxy_core::{serve, Origin, ProxyHandler};
use proxy_store::DiskCache;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::ServeArgs;
use crate::context::Context;

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    let origin = args
        .origin
        .or_else(|| ctx.config.proxy.origin.clone())
        .context("No origin configured: pass --origin or set proxy.origin in the config file")?;
    let origin = Origin::parse(&origin)?;

    let host = args.host.unwrap_or_else(|| ctx.config.proxy.host.clone());
    let port = args.port.unwrap_or(ctx.config.proxy.port);
    let cache_dir = ctx.cache_dir(args.cache_dir.as_deref());

    let store = DiskCache::open(&cache_dir)
        .with_context(|| format!("Failed to open cache at {}", cache_dir.display()))?;

    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    let local_addr = listener.local_addr().context("Failed to read listener address")?;

    info!(listen = %local_addr, origin = %origin.authority(), "proxy server started");
    ctx.output.success(&format!("Proxy listening on http://{}", local_addr));
    ctx.output.kv("Origin", &origin.to_string());
    ctx.output.kv("Cache", &cache_dir.display().to_string());

    let handler = Arc::new(ProxyHandler::new(origin, Arc::new(store)));
    serve(listener, handler, shutdown_signal())
        .await
        .context("Proxy server failed")?;

    ctx.output.info("Proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
}
