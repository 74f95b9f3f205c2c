//! FileSystemBlobStore - one file per blob under a root directory.
//!
//! Layout:
//!
//! ```text
//! <root>/<key>             blob body
//! <root>/.meta/<key>.json  etag, content type, upload time
//! ```
//!
//! Bodies are written to a hidden temp file and renamed into place, so a
//! reader never observes a partial blob. Puts and deletes hold an exclusive
//! lock and reads a shared one, so within the process a body is always
//! reported with its own sidecar and conditional puts are atomic.
//!
//! The ETag returned with a body is recomputed from that body whenever it
//! disagrees with the sidecar, which is only possible after a crash between
//! the sidecar and body renames.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use super::{check_condition, content_etag, validate_key};
use super::{BlobError, BlobMeta, BlobObject, BlobStore, PutCondition};

const META_DIR: &str = ".meta";

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetaFile {
    etag: String,
    size: u64,
    #[serde(default)]
    content_type: Option<String>,
    uploaded_at_ms: u64,
}

/// Blob store persisting each blob as a file.
pub struct FileSystemBlobStore {
    root: PathBuf,
    lock: RwLock<()>,
}

impl FileSystemBlobStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, BlobError> {
        let root = root.into();
        tokio::fs::create_dir_all(root.join(META_DIR)).await?;
        Ok(Self {
            root,
            lock: RwLock::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn body_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join(META_DIR).join(format!("{}.json", key))
    }

    /// Metadata for `key`. With `body`, the ETag is checked against it and
    /// the body wins on mismatch.
    async fn read_meta(
        &self,
        key: &str,
        body: Option<&[u8]>,
    ) -> Result<Option<BlobMeta>, BlobError> {
        let body_path = self.body_path(key);
        let fs_meta = match tokio::fs::metadata(&body_path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match tokio::fs::read(self.meta_path(key)).await {
            Ok(raw) => {
                let meta: MetaFile = serde_json::from_slice(&raw).map_err(|e| {
                    BlobError::Storage(format!("corrupt metadata for {}: {}", key, e))
                })?;
                let etag = match body {
                    Some(body) if content_etag(body) != meta.etag => {
                        tracing::warn!(key = %key, "blob sidecar out of date; using body etag");
                        content_etag(body)
                    }
                    _ => meta.etag,
                };
                Ok(Some(BlobMeta {
                    key: key.to_string(),
                    etag,
                    size: body.map(|b| b.len() as u64).unwrap_or(meta.size),
                    content_type: meta.content_type,
                    uploaded_at: UNIX_EPOCH + Duration::from_millis(meta.uploaded_at_ms),
                }))
            }
            // Blob placed without a sidecar: derive what we can from the file.
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let etag = match body {
                    Some(body) => content_etag(body),
                    None => content_etag(&tokio::fs::read(&body_path).await?),
                };
                Ok(Some(BlobMeta {
                    key: key.to_string(),
                    etag,
                    size: fs_meta.len(),
                    content_type: None,
                    uploaded_at: fs_meta.modified().unwrap_or(UNIX_EPOCH),
                }))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Current metadata with the ETag taken from the body on disk.
    async fn read_current(&self, key: &str) -> Result<Option<BlobMeta>, BlobError> {
        match tokio::fs::read(self.body_path(key)).await {
            Ok(body) => self.read_meta(key, Some(&body)).await,
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), BlobError> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let tmp = self.root.join(format!(".tmp-{}-{}", std::process::id(), nanos));
        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for FileSystemBlobStore {
    async fn get(&self, key: &str) -> Result<Option<BlobObject>, BlobError> {
        if validate_key(key).is_err() {
            return Ok(None);
        }
        let _guard = self.lock.read().await;

        let body = match tokio::fs::read(self.body_path(key)).await {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let meta = self.read_meta(key, Some(&body)).await?;
        Ok(meta.map(|meta| BlobObject {
            meta,
            body: Bytes::from(body),
        }))
    }

    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
        condition: PutCondition,
    ) -> Result<BlobMeta, BlobError> {
        validate_key(key)?;
        let _guard = self.lock.write().await;

        let current = match condition {
            PutCondition::None => None,
            _ => self.read_current(key).await?,
        };
        check_condition(key, &condition, current.as_ref().map(|m| m.etag.as_str()))?;

        let uploaded_at = SystemTime::now();
        let meta = MetaFile {
            etag: content_etag(&body),
            size: body.len() as u64,
            content_type: content_type.map(str::to_string),
            uploaded_at_ms: uploaded_at
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or_default(),
        };
        let meta_bytes =
            serde_json::to_vec(&meta).map_err(|e| BlobError::Storage(e.to_string()))?;

        // Sidecar first. A crash in between leaves the new sidecar beside the
        // old body; gets and conditional puts then derive the etag from the
        // old body, so the old revision keeps its own tag.
        self.write_atomic(&self.meta_path(key), &meta_bytes).await?;
        self.write_atomic(&self.body_path(key), &body).await?;

        Ok(BlobMeta {
            key: key.to_string(),
            etag: meta.etag,
            size: meta.size,
            content_type: meta.content_type,
            uploaded_at,
        })
    }

    async fn delete(&self, key: &str) -> Result<bool, BlobError> {
        validate_key(key)?;
        let _guard = self.lock.write().await;

        let existed = match tokio::fs::remove_file(self.body_path(key)).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        match tokio::fs::remove_file(self.meta_path(key)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(existed)
    }

    async fn list(&self) -> Result<Vec<BlobMeta>, BlobError> {
        let _guard = self.lock.read().await;
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut metas = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if validate_key(&name).is_err() || !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(meta) = self.read_meta(&name, None).await? {
                metas.push(meta);
            }
        }

        metas.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(metas)
    }
}
