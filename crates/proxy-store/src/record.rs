//! Cached response records and their physical artifacts.

use std::collections::BTreeMap;
use std::fmt;

/// Header collection as stored on disk: header name to its values. Names
/// are kept sorted; each name's values keep the order they were received.
pub type HeaderMultiMap = BTreeMap<String, Vec<String>>;

/// Status served for a record whose status artifact is missing or corrupt.
pub const DEFAULT_STATUS: u16 = 200;

/// One of the three physical slots that make up a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    /// Raw response body, stored under the bare key.
    Body,
    /// Decimal status code.
    Status,
    /// JSON-encoded [`HeaderMultiMap`].
    Headers,
}

impl Artifact {
    /// All artifacts, in the order a record is written.
    pub const WRITE_ORDER: [Artifact; 3] = [Artifact::Status, Artifact::Headers, Artifact::Body];

    /// File name suffix appended to the key's file stem.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Body => "",
            Self::Status => "-int",
            Self::Headers => "-headers",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body => write!(f, "body"),
            Self::Status => write!(f, "status"),
            Self::Headers => write!(f, "headers"),
        }
    }
}

/// A complete cached origin response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CachedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMultiMap,
    /// Fully buffered response body.
    pub body: Vec<u8>,
}

impl CachedResponse {
    /// Create a record.
    pub fn new(status: u16, headers: HeaderMultiMap, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }
}
