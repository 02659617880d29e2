//! The store trait and its typed accessors.

use crate::record::{Artifact, CachedResponse, HeaderMultiMap, DEFAULT_STATUS};
use crate::StoreError;

/// Key/value persistence for cached responses.
///
/// Implementors provide raw artifact I/O; the typed accessors and the
/// record-level `lookup`/`store` pair are built on top of it.
pub trait CacheStore: Send + Sync {
    /// Whether the body artifact exists for `key`.
    ///
    /// Says nothing about the status or headers artifacts.
    fn has(&self, key: &str) -> bool;

    /// Read one artifact. `None` if absent or unreadable.
    fn read_artifact(&self, key: &str, artifact: Artifact) -> Option<Vec<u8>>;

    /// Create or overwrite one artifact.
    fn write_artifact(&self, key: &str, artifact: Artifact, bytes: &[u8]) -> Result<(), StoreError>;

    /// Remove every record and recreate empty storage.
    fn clear(&self) -> Result<(), StoreError>;

    /// Raw body for `key`.
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.read_artifact(key, Artifact::Body)
    }

    /// Status code for `key`, parsed as a base-10 integer.
    fn get_int(&self, key: &str) -> Option<i64> {
        let raw = self.read_artifact(key, Artifact::Status)?;
        std::str::from_utf8(&raw).ok()?.parse().ok()
    }

    /// Headers for `key`. Malformed data reads as absent.
    fn get_headers(&self, key: &str) -> Option<HeaderMultiMap> {
        let raw = self.read_artifact(key, Artifact::Headers)?;
        serde_json::from_slice(&raw).ok()
    }

    /// Store the raw body for `key`.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.write_artifact(key, Artifact::Body, value)
    }

    /// Store a status code for `key` as a decimal string.
    fn set_int(&self, key: &str, value: i64) -> Result<(), StoreError> {
        self.write_artifact(key, Artifact::Status, value.to_string().as_bytes())
    }

    /// Store the headers for `key`.
    fn set_headers(&self, key: &str, headers: &HeaderMultiMap) -> Result<(), StoreError> {
        let data = serde_json::to_vec(headers)?;
        self.write_artifact(key, Artifact::Headers, &data)
    }

    /// Read a whole record. See [`read_record`].
    fn lookup(&self, key: &str) -> Option<CachedResponse> {
        read_record(self, key)
    }

    /// Write a whole record. See [`write_record`].
    fn store(&self, key: &str, record: &CachedResponse) -> Result<(), StoreError> {
        write_record(self, key, record)
    }
}

/// Assemble a record from its artifacts.
///
/// A record exists when its body does. A missing or corrupt status falls
/// back to [`DEFAULT_STATUS`], and missing headers read as an empty set.
pub fn read_record<S: CacheStore + ?Sized>(store: &S, key: &str) -> Option<CachedResponse> {
    if !store.has(key) {
        return None;
    }
    let body = store.get(key)?;
    let headers = store.get_headers(key).unwrap_or_default();
    let status = store
        .get_int(key)
        .and_then(|status| u16::try_from(status).ok())
        .unwrap_or(DEFAULT_STATUS);

    Some(CachedResponse {
        status,
        headers,
        body,
    })
}

/// Write status, headers, then body, stopping at the first failure.
///
/// The body goes last so that `has` only turns true once the other two
/// artifacts have landed.
pub fn write_record<S: CacheStore + ?Sized>(
    store: &S,
    key: &str,
    record: &CachedResponse,
) -> Result<(), StoreError> {
    store.set_int(key, i64::from(record.status))?;
    store.set_headers(key, &record.headers)?;
    store.set(key, &record.body)
}
