//! Cache key composition.

use std::fmt;

use http::{Method, Uri};

/// A cache key identifying one stored response.
///
/// Built from the request method and its path and query only. Request
/// headers and bodies never contribute, so header-varying responses
/// (`Vary`) share a slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    key: String,
}

impl CacheKey {
    /// Create a cache key from a string.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Derive the key for a request, or `None` if the method is not cacheable.
    ///
    /// The key is the method followed by the path and query with its
    /// leading `/` removed: `GET /foo?x=1` becomes `GETfoo?x=1`.
    pub fn from_request(method: &Method, uri: &Uri) -> Option<Self> {
        if !is_cacheable_method(method) {
            return None;
        }
        let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        let path_and_query = path_and_query.strip_prefix('/').unwrap_or(path_and_query);

        Some(Self::new(format!("{}{}", method.as_str(), path_and_query)))
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// Methods whose responses may be served from the cache.
pub const CACHEABLE_METHODS: [&str; 3] = ["GET", "HEAD", "OPTIONS"];

/// Whether responses to `method` are cached. Case-insensitive.
pub fn is_cacheable_method(method: &Method) -> bool {
    CACHEABLE_METHODS
        .iter()
        .any(|safe| method.as_str().eq_ignore_ascii_case(safe))
}
