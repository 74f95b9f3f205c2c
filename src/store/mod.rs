//! Config store - versioned read/replace of the project list.
//!
//! The project list is read and replaced as a whole. Writes may carry the
//! [`VersionTag`] the caller last observed; a mismatch is rejected as
//! [`StoreError::Conflict`] and nothing is written. After a successful write,
//! media blobs the old list referenced and the new one does not are deleted
//! on a best-effort basis.
//!
//! ## Example
//!
//! ```ignore
//! use folio_store::{ConfigStore, InMemoryBlobStore, ProjectRecord};
//!
//! let store = ConfigStore::new(InMemoryBlobStore::new());
//! let snapshot = store.read().await?;
//! let outcome = store
//!     .write(vec![ProjectRecord::new(1, "A")], Some(&snapshot.version))
//!     .await?;
//! ```

mod config_store;
mod error;
mod version;

pub use config_store::{
    CleanupReport, ConfigStore, Fallback, ReconcileReport, Snapshot, VersionPolicy, WriteOutcome,
};
pub use error::StoreError;
pub use version::VersionTag;
