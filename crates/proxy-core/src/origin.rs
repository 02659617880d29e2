//! Origin addressing and the buffered HTTP client used to reach it.

use std::fmt;

use bytes::Bytes;
use http::uri::{Authority, Scheme};
use http::{HeaderMap, Method, Request, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use url::Url;

use crate::headers::strip_hop_by_hop;
use crate::ProxyError;

/// The upstream server every request is forwarded to.
///
/// Only the scheme and authority are kept; any path on the configured URL
/// is replaced by the inbound request's path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    scheme: Scheme,
    authority: Authority,
}

impl Origin {
    /// Parse and validate an origin URL such as `http://dummyjson.com`.
    pub fn parse(input: &str) -> Result<Self, ProxyError> {
        let url = Url::parse(input).map_err(|e| ProxyError::InvalidOrigin(format!("{}: {}", input, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProxyError::InvalidOrigin(format!(
                "{}: unsupported scheme `{}`",
                input,
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .ok_or_else(|| ProxyError::InvalidOrigin(format!("{}: missing host", input)))?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let scheme = url
            .scheme()
            .parse::<Scheme>()
            .map_err(|e| ProxyError::InvalidOrigin(format!("{}: {}", input, e)))?;
        let authority = authority
            .parse::<Authority>()
            .map_err(|e| ProxyError::InvalidOrigin(format!("{}: {}", input, e)))?;

        Ok(Self { scheme, authority })
    }

    /// Host and optional port.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// `http` or `https`.
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// Point an inbound request URI at the origin, keeping its path and query.
    ///
    /// Asterisk-form targets (`OPTIONS *`) have no absolute-URI equivalent
    /// and are rejected.
    pub fn rewrite(&self, inbound: &Uri) -> Result<Uri, ProxyError> {
        let path_and_query = inbound.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        if path_and_query == "*" {
            return Err(ProxyError::InvalidRequestUri(
                "asterisk-form request target cannot be forwarded".to_string(),
            ));
        }

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
            .map_err(|e| ProxyError::InvalidRequestUri(format!("{}: {}", inbound, e)))
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}

/// A fully buffered origin response.
#[derive(Debug, Clone)]
pub struct OriginResponse {
    /// Origin status code.
    pub status: StatusCode,
    /// Origin headers, hop-by-hop headers removed.
    pub headers: HeaderMap,
    /// Complete response body.
    pub body: Bytes,
}

/// HTTP client for forwarding requests to the origin.
///
/// Speaks plain HTTP and HTTPS (webpki roots). No timeout or retry is
/// applied beyond the transport's own behavior.
#[derive(Clone)]
pub struct OriginClient {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl Default for OriginClient {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OriginClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OriginClient").finish_non_exhaustive()
    }
}

impl OriginClient {
    /// Create a new client.
    pub fn new() -> Self {
        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();
        let inner = Client::builder(TokioExecutor::new()).build(connector);
        Self { inner }
    }

    /// Send a request and buffer the whole response.
    pub async fn send(
        &self,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<OriginResponse, ProxyError> {
        let mut request = Request::new(Full::new(body));
        *request.method_mut() = method;
        *request.uri_mut() = uri;
        *request.headers_mut() = headers;

        let response = self
            .inner
            .request(request)
            .await
            .map_err(|e| ProxyError::Upstream(error_chain(&e)))?;

        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| ProxyError::UpstreamBody(error_chain(&e)))?
            .to_bytes();

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);

        Ok(OriginResponse {
            status: parts.status,
            headers,
            body,
        })
    }
}

/// Render an error with its sources, e.g. `client error (Connect): connection refused`.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_http_origin() {
        let origin = Origin::parse("http://dummyjson.com").unwrap();
        assert_eq!(origin.scheme(), &Scheme::HTTP);
        assert_eq!(origin.authority().as_str(), "dummyjson.com");
        assert_eq!(origin.to_string(), "http://dummyjson.com");
    }

    #[test]
    fn test_parse_keeps_explicit_port() {
        let origin = Origin::parse("https://127.0.0.1:9443/").unwrap();
        assert_eq!(origin.authority().as_str(), "127.0.0.1:9443");
        assert_eq!(origin.to_string(), "https://127.0.0.1:9443");
    }

    #[test]
    fn test_parse_rejects_bad_origins() {
        assert!(matches!(Origin::parse("not a url"), Err(ProxyError::InvalidOrigin(_))));
        assert!(matches!(Origin::parse("/just/a/path"), Err(ProxyError::InvalidOrigin(_))));
        assert!(matches!(Origin::parse("ftp://example.com"), Err(ProxyError::InvalidOrigin(_))));
    }

    #[test]
    fn test_rewrite_keeps_path_and_query() {
        let origin = Origin::parse("http://example.com:8081/ignored/base").unwrap();
        let inbound: Uri = "/products/1?select=title".parse().unwrap();

        let rewritten = origin.rewrite(&inbound).unwrap();
        assert_eq!(rewritten.to_string(), "http://example.com:8081/products/1?select=title");
    }

    #[test]
    fn test_rewrite_replaces_absolute_inbound_host() {
        let origin = Origin::parse("https://example.com").unwrap();
        let inbound: Uri = "http://localhost:8080/foo".parse().unwrap();

        assert_eq!(origin.rewrite(&inbound).unwrap().to_string(), "https://example.com/foo");
    }

    #[test]
    fn test_rewrite_defaults_to_root() {
        let origin = Origin::parse("http://example.com").unwrap();
        let inbound: Uri = "http://localhost:8080".parse().unwrap();

        assert_eq!(origin.rewrite(&inbound).unwrap().to_string(), "http://example.com/");
    }

    #[test]
    fn test_rewrite_rejects_asterisk_form() {
        let origin = Origin::parse("http://example.com").unwrap();
        let inbound: Uri = "*".parse().unwrap();

        assert!(matches!(origin.rewrite(&inbound), Err(ProxyError::InvalidRequestUri(_))));
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let err = ProxyError::Upstream(error_chain(&io));
        assert_eq!(err.to_string(), "Origin request failed: connection refused");
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
