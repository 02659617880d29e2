//! Directory-backed store.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::record::{Artifact, CachedResponse};
use crate::store::{read_record, write_record, CacheStore};
use crate::StoreError;

const LOCK_STRIPES: usize = 64;

/// Cache store keeping one file per artifact in a single directory.
///
/// File names are the hex SHA-256 digest of the logical key plus the
/// artifact suffix, so keys derived from URLs never reach the filesystem
/// as paths. Each artifact is written to a temporary file and renamed into
/// place.
///
/// Record reads and writes within one process are serialized per key by a
/// fixed set of lock stripes, so [`CacheStore::lookup`] never sees a record
/// that a concurrent [`CacheStore::store`] has only partly written. Other
/// processes sharing the directory are not coordinated with.
#[derive(Debug)]
pub struct DiskCache {
    root: PathBuf,
    stripes: Box<[RwLock<()>]>,
}

impl DiskCache {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        create_root(&root)?;

        let stripes = (0..LOCK_STRIPES).map(|_| RwLock::new(())).collect();
        Ok(Self { root, stripes })
    }

    /// The backing directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of one artifact of `key`.
    pub fn artifact_path(&self, key: &str, artifact: Artifact) -> PathBuf {
        let stem = hex::encode(digest(key));
        self.root.join(format!("{}{}", stem, artifact.suffix()))
    }

    fn stripe(&self, key: &str) -> &RwLock<()> {
        let digest = digest(key);
        &self.stripes[usize::from(digest[0]) % self.stripes.len()]
    }
}

impl CacheStore for DiskCache {
    fn has(&self, key: &str) -> bool {
        !key.is_empty() && self.artifact_path(key, Artifact::Body).is_file()
    }

    fn read_artifact(&self, key: &str, artifact: Artifact) -> Option<Vec<u8>> {
        if key.is_empty() {
            return None;
        }
        let path = self.artifact_path(key, artifact);
        match fs::read(&path) {
            Ok(data) => Some(data),
            Err(err) => {
                if err.kind() != ErrorKind::NotFound {
                    debug!(key, %artifact, path = %path.display(), error = %err, "unreadable cache artifact");
                }
                None
            }
        }
    }

    fn write_artifact(&self, key: &str, artifact: Artifact, bytes: &[u8]) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey("key is empty".to_string()));
        }
        let path = self.artifact_path(key, artifact);
        debug!(key, %artifact, path = %path.display(), len = bytes.len(), "writing cache artifact");

        let mut file = NamedTempFile::new_in(&self.root)
            .map_err(|e| StoreError::Write(format!("{}: {}", self.root.display(), e)))?;
        file.write_all(bytes)
            .map_err(|e| StoreError::Write(format!("{}: {}", path.display(), e)))?;
        file.persist(&path)
            .map_err(|e| StoreError::Persist(format!("{}: {}", path.display(), e.error)))?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        debug!(root = %self.root.display(), "clearing cache directory");
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                return Err(StoreError::Clear(format!("{}: {}", self.root.display(), err)));
            }
        }
        create_root(&self.root)
    }

    fn lookup(&self, key: &str) -> Option<CachedResponse> {
        let _guard = self.stripe(key).read().unwrap_or_else(PoisonError::into_inner);
        read_record(self, key)
    }

    fn store(&self, key: &str, record: &CachedResponse) -> Result<(), StoreError> {
        let _guard = self.stripe(key).write().unwrap_or_else(PoisonError::into_inner);
        write_record(self, key, record)
    }
}

fn create_root(root: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(root).map_err(|e| StoreError::CreateDir(format!("{}: {}", root.display(), e)))
}

fn digest(key: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(key.as_bytes()));
    out
}
