//! Request handling and origin forwarding for the caching proxy.
//!
//! This crate provides:
//! - `ProxyHandler` - Per-request cache lookup, origin forwarding and population
//! - `CacheKey` - Cache key derivation and the safe-method gate
//! - `Origin` / `OriginClient` - Upstream URL rewriting and buffered fetches
//! - `serve` - Connection accept loop feeding requests to the handler
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use proxy_core::{serve, Origin, ProxyHandler};
//! use proxy_store::DiskCache;
//!
//! let origin = Origin::parse("http://dummyjson.com")?;
//! let store = Arc::new(DiskCache::open("./tmp/cache")?);
//! let handler = Arc::new(ProxyHandler::new(origin, store));
//!
//! let listener = tokio::net::TcpListener::bind("localhost:8080").await?;
//! serve(listener, handler, tokio::signal::ctrl_c()).await?;
//! ```

mod error;
mod handler;
mod headers;
mod key;
mod origin;
mod server;

pub use error::*;
pub use handler::*;
pub use headers::*;
pub use key::*;
pub use origin::*;
pub use server::*;
