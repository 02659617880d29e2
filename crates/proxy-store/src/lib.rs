//! Disk-backed response store for the caching proxy.
//!
//! A cached response is kept as three artifacts sharing one logical key:
//! the raw body, the status code, and the response headers. The typed
//! accessors on [`CacheStore`] layer decoding over the raw artifact reads,
//! and any decode failure reads as "not found".
//!
//! # Example
//!
//! ```rust,ignore
//! use proxy_store::{CacheStore, DiskCache, HeaderMultiMap};
//!
//! let cache = DiskCache::open("./tmp/cache")?;
//!
//! cache.set_int("GETfoo", 200)?;
//! cache.set("GETfoo", b"hello")?;
//!
//! assert!(cache.has("GETfoo"));
//! assert_eq!(cache.get_int("GETfoo"), Some(200));
//!
//! // Wipe everything.
//! cache.clear()?;
//! ```

mod disk;
mod error;
mod record;
mod store;

pub use disk::DiskCache;
pub use error::StoreError;
pub use record::{Artifact, CachedResponse, HeaderMultiMap, DEFAULT_STATUS};
pub use store::{read_record, write_record, CacheStore};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{CacheStore, CachedResponse, DiskCache, HeaderMultiMap, StoreError};
}
