use std::fmt;

use crate::blob::BlobError;
use crate::project::DocumentError;

use super::VersionTag;

/// Error type for config store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The caller's version tag does not match the stored one.
    Conflict {
        expected: VersionTag,
        actual: VersionTag,
    },
    /// A version tag is required for writes and none was supplied.
    VersionRequired,
    /// The stored document could not be decoded or encoded.
    Document(DocumentError),
    /// The blob store failed.
    Storage(BlobError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Conflict { expected, actual } => write!(
                f,
                "config was modified concurrently (expected version {}, current {})",
                expected, actual
            ),
            StoreError::VersionRequired => {
                write!(f, "an If-Match version is required to save the config")
            }
            StoreError::Document(e) => write!(f, "{}", e),
            StoreError::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Document(e) => Some(e),
            StoreError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DocumentError> for StoreError {
    fn from(err: DocumentError) -> Self {
        StoreError::Document(err)
    }
}

impl From<BlobError> for StoreError {
    fn from(err: BlobError) -> Self {
        StoreError::Storage(err)
    }
}
