use bytes::Bytes;
use serde::Serialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::blob::{BlobError, BlobStore, PutCondition};
use crate::media::{media_keys, media_refs};
use crate::project::{builtin_projects, ConfigDocument, ProjectRecord, CONFIG_KEY};

use super::{StoreError, VersionTag};

/// What a read returns before anything has been stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Fallback {
    /// The built-in project list.
    #[default]
    Builtin,
    /// An empty list.
    Empty,
}

impl Fallback {
    pub fn projects(self) -> Vec<ProjectRecord> {
        match self {
            Fallback::Builtin => builtin_projects(),
            Fallback::Empty => Vec::new(),
        }
    }
}

/// Whether writes must carry a version tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VersionPolicy {
    /// Writes without a tag overwrite unconditionally.
    #[default]
    Optional,
    /// Writes without a tag are rejected.
    Required,
}

/// The current document and its version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub document: ConfigDocument,
    pub version: VersionTag,
}

/// Media blobs touched by the post-write cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
}

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub document: ConfigDocument,
    pub version: VersionTag,
    pub cleanup: CleanupReport,
}

/// Result of a full media reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Media blobs examined (the config blob is not counted).
    pub scanned: usize,
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
    /// Unreferenced blobs kept because they are younger than the grace period.
    pub retained_recent: usize,
}

/// Versioned store for the project list.
///
/// Generic over `B`, the blob store holding both the document and the media
/// it references.
pub struct ConfigStore<B> {
    blobs: B,
    fallback: Fallback,
    policy: VersionPolicy,
}

impl<B> ConfigStore<B> {
    /// Create a store with the built-in fallback and optional versioning.
    pub fn new(blobs: B) -> Self {
        Self {
            blobs,
            fallback: Fallback::default(),
            policy: VersionPolicy::default(),
        }
    }

    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_version_policy(mut self, policy: VersionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Get a reference to the blob store.
    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    pub fn version_policy(&self) -> VersionPolicy {
        self.policy
    }
}

impl<B: BlobStore> ConfigStore<B> {
    /// Read the current document, or the fallback with the `"initial"` tag.
    pub async fn read(&self) -> Result<Snapshot, StoreError> {
        match self.blobs.get(CONFIG_KEY).await? {
            Some(object) => Ok(Snapshot {
                document: ConfigDocument::from_bytes(&object.body)?,
                version: VersionTag::new(object.meta.etag),
            }),
            None => Ok(Snapshot {
                document: ConfigDocument::new(self.fallback.projects(), None),
                version: VersionTag::initial(),
            }),
        }
    }

    /// Replace the whole project list.
    ///
    /// With `if_match`, the write only happens if the stored version still
    /// equals it (`"initial"` means nothing may be stored yet, `*` means
    /// something must be). Media cleanup
    /// runs after the document is committed and never fails the write.
    pub async fn write(
        &self,
        projects: Vec<ProjectRecord>,
        if_match: Option<&VersionTag>,
    ) -> Result<WriteOutcome, StoreError> {
        let current = self.blobs.get(CONFIG_KEY).await?;
        let current_version = current
            .as_ref()
            .map(|object| VersionTag::new(object.meta.etag.clone()))
            .unwrap_or_else(VersionTag::initial);

        let condition = match if_match {
            None if self.policy == VersionPolicy::Required => {
                return Err(StoreError::VersionRequired);
            }
            None => PutCondition::None,
            Some(expected) if expected.is_any() => {
                if current_version.is_initial() {
                    return Err(StoreError::Conflict {
                        expected: expected.clone(),
                        actual: current_version,
                    });
                }
                PutCondition::IfMatch(current_version.as_str().to_string())
            }
            Some(expected) if *expected != current_version => {
                tracing::info!(
                    expected = %expected,
                    current = %current_version,
                    "rejecting stale config write"
                );
                return Err(StoreError::Conflict {
                    expected: expected.clone(),
                    actual: current_version,
                });
            }
            Some(expected) if expected.is_initial() => PutCondition::IfAbsent,
            Some(expected) => PutCondition::IfMatch(expected.as_str().to_string()),
        };

        let previous = current.and_then(|object| match ConfigDocument::from_bytes(&object.body) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!(error = %e, "previous config unreadable; skipping media cleanup");
                None
            }
        });

        let document = ConfigDocument::new(projects, Some(now_millis()));
        let body = Bytes::from(document.to_bytes()?);

        let meta = self
            .blobs
            .put(CONFIG_KEY, body, Some("application/json"), condition)
            .await
            .map_err(|e| match e {
                BlobError::PreconditionFailed { actual, .. } => StoreError::Conflict {
                    expected: if_match.cloned().unwrap_or_else(VersionTag::initial),
                    actual: actual.map(VersionTag::new).unwrap_or_else(VersionTag::initial),
                },
                other => StoreError::Storage(other),
            })?;
        let version = VersionTag::new(meta.etag);

        tracing::info!(
            projects = document.projects.len(),
            version = %version,
            "config saved"
        );

        let cleanup = match previous {
            Some(previous) => self.remove_stale_media(&previous, &document).await,
            None => CleanupReport::default(),
        };

        Ok(WriteOutcome {
            document,
            version,
            cleanup,
        })
    }

    /// Delete internal media referenced by `previous` but not by `current`.
    async fn remove_stale_media(
        &self,
        previous: &ConfigDocument,
        current: &ConfigDocument,
    ) -> CleanupReport {
        let old_keys = media_keys(&media_refs(&previous.projects));
        let new_keys = media_keys(&media_refs(&current.projects));
        let mut report = CleanupReport::default();

        for key in old_keys.difference(&new_keys) {
            if key == CONFIG_KEY {
                continue;
            }
            match self.blobs.delete(key).await {
                Ok(_) => {
                    tracing::info!(key = %key, "deleted unreferenced media");
                    report.deleted.push(key.clone());
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "failed to delete unreferenced media");
                    report.failed.push(key.clone());
                }
            }
        }

        report
    }

    /// Delete every media blob the current document does not reference.
    ///
    /// Blobs uploaded less than `grace` ago are kept, since their document
    /// save may still be in flight. Safe to run repeatedly.
    pub async fn reconcile_media(&self, grace: Duration) -> Result<ReconcileReport, StoreError> {
        let snapshot = self.read().await?;
        let referenced = media_keys(&media_refs(&snapshot.document.projects));
        let now = SystemTime::now();
        let mut report = ReconcileReport::default();

        for meta in self.blobs.list().await? {
            if meta.key == CONFIG_KEY {
                continue;
            }
            report.scanned += 1;

            if referenced.contains(&meta.key) {
                continue;
            }

            let age = now.duration_since(meta.uploaded_at).unwrap_or(Duration::ZERO);
            if age < grace {
                report.retained_recent += 1;
                continue;
            }

            match self.blobs.delete(&meta.key).await {
                Ok(_) => report.deleted.push(meta.key),
                Err(e) => {
                    tracing::warn!(key = %meta.key, error = %e, "failed to delete orphaned media");
                    report.failed.push(meta.key);
                }
            }
        }

        tracing::info!(
            scanned = report.scanned,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            retained_recent = report.retained_recent,
            "media reconciliation finished"
        );

        Ok(report)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
