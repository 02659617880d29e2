//! Connection accept loop.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use hyper_util::server::graceful::GracefulShutdown;
use proxy_store::CacheStore;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::handler::ProxyHandler;

/// Serve HTTP/1.1 and HTTP/2 (h2c) connections from `listener` until
/// `shutdown` resolves, then wait for in-flight connections to finish.
///
/// Each connection runs on its own task; requests on it are passed to
/// `handler`.
pub async fn serve<S, F>(
    listener: TcpListener,
    handler: Arc<ProxyHandler<S>>,
    shutdown: F,
) -> std::io::Result<()>
where
    S: CacheStore + 'static,
    F: Future,
{
    let builder = Builder::new(TokioExecutor::new());
    let graceful = GracefulShutdown::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested, draining connections");
                break;
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(err) => {
                        warn!(error = %err, "failed to accept connection");
                        continue;
                    }
                };
                debug!(%peer, "accepted connection");

                let handler = Arc::clone(&handler);
                let service = service_fn(move |request: Request<Incoming>| {
                    let handler = Arc::clone(&handler);
                    async move { Ok::<_, Infallible>(handler.handle(request).await) }
                });

                let builder = builder.clone();
                let watcher = graceful.watcher();
                tokio::spawn(async move {
                    let conn = builder.serve_connection(TokioIo::new(stream), service);
                    if let Err(err) = watcher.watch(conn).await {
                        debug!(%peer, error = %err, "connection closed with error");
                    }
                });
            }
        }
    }

    drop(listener);
    graceful.shutdown().await;
    Ok(())
}
