//! InMemoryBlobStore - HashMap-backed blob store for tests and ephemeral deployments.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use super::{check_condition, content_etag, validate_key};
use super::{BlobError, BlobMeta, BlobObject, BlobStore, PutCondition};

/// In-memory blob store backed by a HashMap.
///
/// Clone-friendly via Arc: clones share the same storage.
#[derive(Clone, Default)]
pub struct InMemoryBlobStore {
    storage: Arc<RwLock<HashMap<String, BlobObject>>>,
}

impl InMemoryBlobStore {
    /// Create a new empty blob store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.storage.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a blob exists under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.storage
            .read()
            .map(|s| s.contains_key(key))
            .unwrap_or(false)
    }

    /// Backdate a blob's upload time. Used to exercise age-based cleanup.
    pub fn set_uploaded_at(&self, key: &str, at: SystemTime) -> Result<(), BlobError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| BlobError::Storage("lock poisoned".into()))?;
        if let Some(object) = storage.get_mut(key) {
            object.meta.uploaded_at = at;
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<BlobObject>, BlobError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| BlobError::Storage("lock poisoned".into()))?;
        Ok(storage.get(key).cloned())
    }

    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
        condition: PutCondition,
    ) -> Result<BlobMeta, BlobError> {
        validate_key(key)?;

        let mut storage = self
            .storage
            .write()
            .map_err(|_| BlobError::Storage("lock poisoned".into()))?;

        let current = storage.get(key).map(|o| o.meta.etag.as_str());
        check_condition(key, &condition, current)?;

        let meta = BlobMeta {
            key: key.to_string(),
            etag: content_etag(&body),
            size: body.len() as u64,
            content_type: content_type.map(str::to_string),
            uploaded_at: SystemTime::now(),
        };
        storage.insert(
            key.to_string(),
            BlobObject {
                meta: meta.clone(),
                body,
            },
        );

        Ok(meta)
    }

    async fn delete(&self, key: &str) -> Result<bool, BlobError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| BlobError::Storage("lock poisoned".into()))?;
        Ok(storage.remove(key).is_some())
    }

    async fn list(&self) -> Result<Vec<BlobMeta>, BlobError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| BlobError::Storage("lock poisoned".into()))?;
        let mut metas: Vec<BlobMeta> = storage.values().map(|o| o.meta.clone()).collect();
        metas.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(metas)
    }
}
