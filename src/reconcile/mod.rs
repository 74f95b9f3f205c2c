//! Background media reconciliation.
//!
//! Periodically runs [`ConfigStore::reconcile_media`] so orphans left by
//! failed cleanups or abandoned uploads are eventually collected.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::blob::BlobStore;
use crate::store::ConfigStore;

/// Shortest period between passes.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Totals accumulated by a [`MediaReconciler`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcilerStats {
    pub passes: usize,
    pub blobs_deleted: usize,
    pub deletes_failed: usize,
    /// Passes that could not run at all (document unreadable, listing failed).
    pub passes_failed: usize,
}

/// A background task that reconciles media on a fixed interval.
///
/// ## Example
///
/// ```ignore
/// let reconciler = MediaReconciler::spawn(
///     store.clone(),
///     Duration::from_secs(300),
///     Duration::from_secs(3600),
/// );
///
/// // ... serve ...
///
/// let stats = reconciler.stop().await;
/// ```
pub struct MediaReconciler {
    stop_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<ReconcilerStats>>,
}

impl MediaReconciler {
    /// Spawn the task on the current tokio runtime. The first pass runs
    /// immediately, then once per `interval` (at least [`MIN_INTERVAL`]).
    pub fn spawn<B>(store: Arc<ConfigStore<B>>, interval: Duration, grace: Duration) -> Self
    where
        B: BlobStore + 'static,
    {
        let interval = interval.max(MIN_INTERVAL);
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut stats = ReconcilerStats::default();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                        continue;
                    }
                }

                stats.passes += 1;
                match store.reconcile_media(grace).await {
                    Ok(report) => {
                        stats.blobs_deleted += report.deleted.len();
                        stats.deletes_failed += report.failed.len();
                    }
                    Err(e) => {
                        stats.passes_failed += 1;
                        tracing::warn!(error = %e, "media reconciliation pass failed");
                    }
                }
            }

            tracing::debug!(passes = stats.passes, "media reconciler stopped");
            stats
        });

        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Signal the task to stop and wait for it. Returns the totals.
    pub async fn stop(mut self) -> ReconcilerStats {
        let _ = self.stop_tx.send(true);
        match self.handle.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => ReconcilerStats::default(),
        }
    }

    /// Signal the task to stop without waiting.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(true);
    }
}

impl Drop for MediaReconciler {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
    }
}
