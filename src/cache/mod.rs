//! Content-addressed cache for raw page bodies
//! Uses Apache Arrow object_store crate

use bytes::Bytes;
use object_store::{ObjectStore, path::Path as StoragePath};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Invalid cache root {root}: {source}")]
    InvalidRoot {
        root: String,
        source: std::io::Error,
    },

    #[error("Object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),
}

/// Cache result type
pub type Result<T> = std::result::Result<T, CacheError>;

/// Length of the hex-rendered digest used to name cache entries
const KEY_LEN: usize = 16;

/// Cache store wrapping object_store
///
/// Entries are keyed by a truncated digest of the target URL, so a rerun
/// over the same list resumes from whatever is already on disk. Entries are
/// written atomically and never mutated or deleted here.
#[derive(Clone)]
pub struct CacheStore {
    store: Arc<dyn ObjectStore>,
}

impl CacheStore {
    /// Create new cache store with any object_store backend
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Cache rooted at a local directory, created if missing
    pub fn local(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root).map_err(|e| CacheError::InvalidRoot {
            root: root.display().to_string(),
            source: e,
        })?;

        let store = object_store::local::LocalFileSystem::new_with_prefix(root)?;

        Ok(Self {
            store: Arc::new(store),
        })
    }

    /// Create in-memory cache for testing/development
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(object_store::memory::InMemory::new()),
        }
    }

    /// Deterministic storage key for a target URL
    pub fn key(target: &str) -> String {
        let digest = Sha256::digest(target.as_bytes());
        format!("{}.html", &hex::encode(digest)[..KEY_LEN])
    }

    /// True iff an entry for this target exists and is non-empty
    pub async fn has(&self, target: &str) -> Result<bool> {
        let path = StoragePath::from(Self::key(target));

        match self.store.head(&path).await {
            Ok(meta) => Ok(meta.size > 0),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist raw bytes for a target under its key
    ///
    /// The local backend stages to a temp file and renames, so an
    /// interrupted run never leaves a partial entry behind.
    pub async fn write(&self, target: &str, data: Bytes) -> Result<()> {
        let path = StoragePath::from(Self::key(target));
        let size = data.len();

        self.store.put(&path, data.into()).await?;

        tracing::debug!(url = target, key = %path, size, "Cached page body");

        Ok(())
    }

    /// Fetch an entry's raw bytes (used by tests and downstream extractors)
    pub async fn read(&self, target: &str) -> Result<Bytes> {
        let path = StoragePath::from(Self::key(target));

        let result = self.store.get(&path).await?;
        let bytes = result.bytes().await?;

        Ok(bytes)
    }
}
