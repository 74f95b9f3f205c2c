//! Blob storage - keyed byte objects with a content ETag.
//!
//! The config document and every uploaded media file live in one
//! [`BlobStore`]. Each stored object carries an ETag derived from its
//! content; conditional puts compare against it.
//!
//! ## Example
//!
//! ```ignore
//! use folio_store::{BlobStore, InMemoryBlobStore, PutCondition};
//!
//! let store = InMemoryBlobStore::new();
//! let meta = store.put("a.png", bytes, Some("image/png"), PutCondition::IfAbsent).await?;
//! let object = store.get("a.png").await?.expect("stored");
//! assert_eq!(object.meta.etag, meta.etag);
//! ```

mod fs;
mod in_memory;

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

pub use fs::FileSystemBlobStore;
pub use in_memory::InMemoryBlobStore;

/// Metadata for a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMeta {
    pub key: String,
    pub etag: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub uploaded_at: SystemTime,
}

/// A stored blob: metadata plus body.
#[derive(Debug, Clone)]
pub struct BlobObject {
    pub meta: BlobMeta,
    pub body: Bytes,
}

/// Precondition for a put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutCondition {
    /// Always write.
    None,
    /// Write only if no object exists under the key.
    IfAbsent,
    /// Write only if the current object's ETag equals this one.
    IfMatch(String),
}

/// Error type for blob store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobError {
    /// A put precondition did not hold.
    PreconditionFailed {
        key: String,
        expected: Option<String>,
        actual: Option<String>,
    },
    /// Key is not usable as a blob name.
    InvalidKey(String),
    /// Storage-level failure (I/O, lock poisoning, backend unreachable).
    Storage(String),
}

impl fmt::Display for BlobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobError::PreconditionFailed {
                key,
                expected,
                actual,
            } => write!(
                f,
                "precondition failed for blob {} (expected {}, actual {})",
                key,
                expected.as_deref().unwrap_or("<absent>"),
                actual.as_deref().unwrap_or("<absent>")
            ),
            BlobError::InvalidKey(key) => write!(f, "invalid blob key: {:?}", key),
            BlobError::Storage(msg) => write!(f, "blob storage error: {}", msg),
        }
    }
}

impl std::error::Error for BlobError {}

impl From<std::io::Error> for BlobError {
    fn from(err: std::io::Error) -> Self {
        BlobError::Storage(err.to_string())
    }
}

/// Abstract keyed blob storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch a blob. Returns `None` if the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<BlobObject>, BlobError>;

    /// Store a blob, subject to `condition`. Returns the new metadata.
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
        condition: PutCondition,
    ) -> Result<BlobMeta, BlobError>;

    /// Delete a blob. Returns true if it existed.
    async fn delete(&self, key: &str) -> Result<bool, BlobError>;

    /// Metadata for every stored blob.
    async fn list(&self) -> Result<Vec<BlobMeta>, BlobError>;
}

#[async_trait]
impl<T: BlobStore + ?Sized> BlobStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<BlobObject>, BlobError> {
        (**self).get(key).await
    }

    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
        condition: PutCondition,
    ) -> Result<BlobMeta, BlobError> {
        (**self).put(key, body, content_type, condition).await
    }

    async fn delete(&self, key: &str) -> Result<bool, BlobError> {
        (**self).delete(key).await
    }

    async fn list(&self) -> Result<Vec<BlobMeta>, BlobError> {
        (**self).list().await
    }
}

/// Content ETag: first 16 bytes of the SHA-256 digest, hex encoded.
pub fn content_etag(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    hex::encode(&digest[..16])
}

/// Check `condition` against the current ETag (if any) of `key`.
pub(crate) fn check_condition(
    key: &str,
    condition: &PutCondition,
    current: Option<&str>,
) -> Result<(), BlobError> {
    let holds = match condition {
        PutCondition::None => true,
        PutCondition::IfAbsent => current.is_none(),
        PutCondition::IfMatch(expected) => current == Some(expected.as_str()),
    };

    if holds {
        return Ok(());
    }

    Err(BlobError::PreconditionFailed {
        key: key.to_string(),
        expected: match condition {
            PutCondition::IfMatch(expected) => Some(expected.clone()),
            _ => None,
        },
        actual: current.map(str::to_string),
    })
}

/// Keys must be a single, non-hidden path segment.
pub(crate) fn validate_key(key: &str) -> Result<(), BlobError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && !key.contains(['/', '\\'])
        && !key.chars().any(char::is_control);

    if valid {
        Ok(())
    } else {
        Err(BlobError::InvalidKey(key.to_string()))
    }
}
