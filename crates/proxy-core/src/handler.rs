//! Per-request cache routing.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use proxy_store::{CacheStore, CachedResponse};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::headers::{forwardable_request_headers, from_multimap, to_multimap, CacheStatus};
use crate::key::CacheKey;
use crate::origin::{Origin, OriginClient, OriginResponse};
use crate::ProxyError;

/// Caching reverse proxy for a single origin.
///
/// Safe-method requests (GET, HEAD, OPTIONS) are keyed by method, path and
/// query. A stored response is replayed with `X-Cache: HIT`; otherwise the
/// request is forwarded, the response is stored, and it is relayed with
/// `X-Cache: MISS`. Other methods are always forwarded and never stored.
///
/// Concurrent misses on the same key each fetch from the origin; the store
/// keeps whichever complete record was written last.
pub struct ProxyHandler<S> {
    origin: Origin,
    client: OriginClient,
    store: Arc<S>,
}

impl<S> fmt::Debug for ProxyHandler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyHandler")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl<S: CacheStore + 'static> ProxyHandler<S> {
    /// Create a handler forwarding to `origin` and caching into `store`.
    pub fn new(origin: Origin, store: Arc<S>) -> Self {
        Self::with_client(origin, store, OriginClient::new())
    }

    /// Create a handler with a preconfigured client.
    pub fn with_client(origin: Origin, store: Arc<S>, client: OriginClient) -> Self {
        Self {
            origin,
            client,
            store,
        }
    }

    /// The configured origin.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// The shared store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Handle one inbound request.
    pub async fn handle<B>(&self, request: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: fmt::Display,
    {
        let span = info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
        );
        self.route(request).instrument(span).await
    }

    async fn route<B>(&self, request: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: fmt::Display,
    {
        let Some(key) = CacheKey::from_request(request.method(), request.uri()) else {
            info!("method not cacheable, forwarding");
            return self.forward(request, None).await;
        };

        match self.lookup(&key).await {
            Some(cached) => {
                info!(%key, "cache hit");
                cached_response(cached)
            }
            None => {
                info!(%key, "cache miss");
                self.forward(request, Some(key)).await
            }
        }
    }

    async fn lookup(&self, key: &CacheKey) -> Option<CachedResponse> {
        let store = Arc::clone(&self.store);
        let key = key.as_str().to_string();
        match tokio::task::spawn_blocking(move || store.lookup(&key)).await {
            Ok(found) => found,
            Err(err) => {
                warn!(error = %err, "cache lookup task failed");
                None
            }
        }
    }

    async fn forward<B>(&self, request: Request<B>, key: Option<CacheKey>) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: fmt::Display,
    {
        let fetched = match self.fetch(request).await {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!(error = %err, "origin fetch failed");
                return error_response(err.status_code());
            }
        };

        if let Some(key) = key {
            self.persist(key, &fetched).await;
        }

        build_response(fetched.status, fetched.headers, fetched.body, CacheStatus::Miss)
    }

    async fn fetch<B>(&self, request: Request<B>) -> Result<OriginResponse, ProxyError>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: fmt::Display,
    {
        let (parts, body) = request.into_parts();
        let uri = self.origin.rewrite(&parts.uri)?;
        let body = body
            .collect()
            .await
            .map_err(|e| ProxyError::RequestBody(e.to_string()))?
            .to_bytes();

        debug!(%uri, "forwarding to origin");
        self.client
            .send(parts.method, uri, forwardable_request_headers(parts.headers), body)
            .await
    }

    /// Store a fetched response. Failures are logged and otherwise ignored.
    async fn persist(&self, key: CacheKey, fetched: &OriginResponse) {
        let record = CachedResponse::new(
            fetched.status.as_u16(),
            to_multimap(&fetched.headers),
            fetched.body.to_vec(),
        );
        let store = Arc::clone(&self.store);
        let stored = tokio::task::spawn_blocking(move || store.store(key.as_str(), &record)).await;

        match stored {
            Ok(Ok(())) => debug!("response cached"),
            Ok(Err(err)) => warn!(error = %err, "failed to cache response"),
            Err(err) => warn!(error = %err, "cache write task failed"),
        }
    }
}

fn cached_response(cached: CachedResponse) -> Response<Full<Bytes>> {
    let status = StatusCode::from_u16(cached.status).unwrap_or(StatusCode::OK);
    build_response(
        status,
        from_multimap(&cached.headers),
        Bytes::from(cached.body),
        CacheStatus::Hit,
    )
}

fn build_response(
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    cache: CacheStatus,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    cache.apply(response.headers_mut());
    response
}

fn error_response(status: StatusCode) -> Response<Full<Bytes>> {
    build_response(status, HeaderMap::new(), Bytes::new(), CacheStatus::Miss)
}

#[cfg(test)]
mod tests {
    use proxy_store::HeaderMultiMap;

    use super::*;

    #[test]
    fn test_cached_response_uses_stored_status() {
        let mut headers = HeaderMultiMap::new();
        headers.insert("content-type".to_string(), vec!["text/plain".to_string()]);
        let response = cached_response(CachedResponse::new(404, headers, b"gone".to_vec()));

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers().get("content-type").unwrap(), "text/plain");
        assert_eq!(response.headers().get("x-cache").unwrap(), "HIT");
    }

    #[test]
    fn test_cached_response_with_invalid_status_falls_back_to_ok() {
        let response = cached_response(CachedResponse::new(42, HeaderMultiMap::new(), Vec::new()));
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_error_response_is_empty_miss() {
        let response = error_response(StatusCode::BAD_GATEWAY);
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(response.headers().len(), 1);
        assert_eq!(response.headers().get("x-cache").unwrap(), "MISS");
    }
}
