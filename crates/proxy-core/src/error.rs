//! Error types for the proxy.

use http::StatusCode;
use thiserror::Error;

/// Errors that can occur while proxying a request.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Origin URL is unusable.
    #[error("Invalid origin: {0}")]
    InvalidOrigin(String),

    /// Inbound request URI could not be rewritten against the origin.
    #[error("Invalid request URI: {0}")]
    InvalidRequestUri(String),

    /// Failed to read the inbound request body.
    #[error("Failed to read request body: {0}")]
    RequestBody(String),

    /// Origin could not be reached.
    #[error("Origin request failed: {0}")]
    Upstream(String),

    /// Origin response body could not be read.
    #[error("Failed to read origin response: {0}")]
    UpstreamBody(String),
}

impl ProxyError {
    /// Status code returned to the caller for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidOrigin(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRequestUri(_) | Self::RequestBody(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::UpstreamBody(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
