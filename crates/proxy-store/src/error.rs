//! Store error types.

use thiserror::Error;

/// Errors that can occur when writing to or administering the store.
///
/// Reads never produce errors: a missing or unreadable artifact is reported
/// as absent.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The key cannot address a record.
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    /// Failed to create the backing directory.
    #[error("Failed to create cache directory: {0}")]
    CreateDir(String),

    /// Failed to write an artifact.
    #[error("Failed to write cache artifact: {0}")]
    Write(String),

    /// Failed to move a written artifact into place.
    #[error("Failed to persist cache artifact: {0}")]
    Persist(String),

    /// Failed to encode a value.
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Failed to remove the backing directory.
    #[error("Failed to clear cache: {0}")]
    Clear(String),
}
