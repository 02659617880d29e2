//! Cache status header and header conversions.

use std::fmt;

use http::header::{HeaderName, HeaderValue, CONNECTION, HOST};
use http::HeaderMap;
use proxy_store::HeaderMultiMap;
use tracing::debug;

/// Header names used by the proxy.
pub mod header_names {
    /// Cache status header (HIT, MISS).
    pub const X_CACHE: &str = "x-cache";
}

/// Headers that describe a single connection and are never forwarded.
pub const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Whether a response came from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from the cache.
    Hit,
    /// Fetched from the origin.
    Miss,
}

impl CacheStatus {
    /// Header value for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }

    /// Set `X-Cache` on `headers`, replacing any existing value.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(
            HeaderName::from_static(header_names::X_CACHE),
            HeaderValue::from_static(self.as_str()),
        );
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
}

/// Prepare inbound request headers for forwarding to the origin.
///
/// `Host` is dropped so the client derives it from the origin URL.
pub fn forwardable_request_headers(mut headers: HeaderMap) -> HeaderMap {
    strip_hop_by_hop(&mut headers);
    headers.remove(HOST);
    headers
}

/// Convert a header map into its stored form.
///
/// Values that are not valid UTF-8 are stored lossily.
pub fn to_multimap(headers: &HeaderMap) -> HeaderMultiMap {
    let mut map = HeaderMultiMap::new();
    for (name, value) in headers {
        map.entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    map
}

/// Rebuild a header map from its stored form, skipping invalid entries.
pub fn from_multimap(map: &HeaderMultiMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, values) in map {
        let Ok(header) = HeaderName::from_bytes(name.as_bytes()) else {
            debug!(name = %name, "skipping invalid stored header name");
            continue;
        };
        for value in values {
            match HeaderValue::from_str(value) {
                Ok(value) => {
                    headers.append(header.clone(), value);
                }
                Err(_) => debug!(name = %name, "skipping invalid stored header value"),
            }
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_status_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-cache", HeaderValue::from_static("stale-from-origin"));

        CacheStatus::Hit.apply(&mut headers);
        assert_eq!(headers.get("X-Cache").unwrap(), "HIT");
        assert_eq!(headers.get_all("x-cache").iter().count(), 1);

        CacheStatus::Miss.apply(&mut headers);
        assert_eq!(headers.get("x-cache").unwrap(), "MISS");
    }

    #[test]
    fn test_multimap_preserves_repeated_values() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        headers.insert("content-type", HeaderValue::from_static("text/plain"));

        let map = to_multimap(&headers);
        assert_eq!(map["set-cookie"], vec!["a=1", "b=2"]);
        assert_eq!(map["content-type"], vec!["text/plain"]);

        let rebuilt = from_multimap(&map);
        let cookies: Vec<_> = rebuilt.get_all("set-cookie").iter().collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
        assert_eq!(rebuilt.get("Content-Type").unwrap(), "text/plain");
    }

    #[test]
    fn test_from_multimap_accepts_mixed_case_names() {
        let mut map = HeaderMultiMap::new();
        map.insert("Content-Type".to_string(), vec!["text/html".to_string()]);

        let headers = from_multimap(&map);
        assert_eq!(headers.get("content-type").unwrap(), "text/html");
    }

    #[test]
    fn test_from_multimap_skips_invalid_entries() {
        let mut map = HeaderMultiMap::new();
        map.insert("bad header".to_string(), vec!["x".to_string()]);
        map.insert("x-ok".to_string(), vec!["fine".to_string(), "bad\nvalue".to_string()]);

        let headers = from_multimap(&map);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("x-ok").unwrap(), "fine");
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("connection", HeaderValue::from_static("keep-alive, x-session"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.insert("x-session", HeaderValue::from_static("abc"));
        headers.insert("content-type", HeaderValue::from_static("text/plain"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key("content-type"));
    }

    #[test]
    fn test_forwardable_request_headers_drop_host() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("localhost:8080"));
        headers.insert("accept", HeaderValue::from_static("*/*"));
        headers.insert("upgrade", HeaderValue::from_static("websocket"));

        let forwarded = forwardable_request_headers(headers);
        assert!(!forwarded.contains_key("host"));
        assert!(!forwarded.contains_key("upgrade"));
        assert_eq!(forwarded.get("accept").unwrap(), "*/*");
    }
}
