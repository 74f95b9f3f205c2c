//! Project records and the persisted config document.
//!
//! The whole project list is stored as one serialized [`ConfigDocument`]
//! under [`CONFIG_KEY`]. Writes always replace the full list.
//!
//! ## Example
//!
//! ```ignore
//! use folio_store::{ConfigDocument, ProjectRecord};
//!
//! let projects = vec![ProjectRecord::new(1, "Brand identity")];
//! let doc = ConfigDocument::new(projects, Some(1_700_000_000_000));
//! let bytes = doc.to_bytes()?;
//! let back = ConfigDocument::from_bytes(&bytes)?;
//! assert_eq!(back.projects, doc.projects);
//! ```

mod defaults;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use defaults::builtin_projects;

/// Blob key the config document is stored under.
pub const CONFIG_KEY: &str = "portfolio-config.json";

/// Current envelope schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// A single portfolio entry.
///
/// `id` is assigned by the caller; uniqueness is not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behance_url: Option<String>,
}

impl ProjectRecord {
    /// Create a record with an empty description and no media.
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            image: None,
            video: None,
            tags: Vec::new(),
            live_url: None,
            behance_url: None,
        }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    pub fn with_video(mut self, url: impl Into<String>) -> Self {
        self.video = Some(url.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// The persisted unit: the ordered project list plus envelope metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    pub schema_version: u32,
    /// Unix millis of the write that produced this document. `None` for
    /// fallback documents that were never stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<u64>,
    pub projects: Vec<ProjectRecord>,
}

/// Error decoding or encoding a stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The bytes are not any known document shape.
    Malformed(String),
    /// The envelope was written by a newer schema.
    UnsupportedSchema { found: u32, supported: u32 },
    /// Serialization failed.
    Encode(String),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::Malformed(msg) => write!(f, "malformed config document: {}", msg),
            DocumentError::UnsupportedSchema { found, supported } => write!(
                f,
                "unsupported config schema version {} (supported up to {})",
                found, supported
            ),
            DocumentError::Encode(msg) => write!(f, "config document encode error: {}", msg),
        }
    }
}

impl std::error::Error for DocumentError {}

/// Every shape the document has been stored in.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredShape {
    Envelope(ConfigDocument),
    Listed { projects: Vec<ProjectRecord> },
    Wrapped { data: Vec<ProjectRecord> },
    Bare(Vec<ProjectRecord>),
}

impl ConfigDocument {
    pub fn new(projects: Vec<ProjectRecord>, updated_at: Option<u64>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            updated_at,
            projects,
        }
    }

    /// Decode stored bytes, accepting the legacy bare-array, `{data}` and
    /// unversioned `{projects}` shapes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        let shape: StoredShape =
            serde_json::from_slice(bytes).map_err(|e| DocumentError::Malformed(e.to_string()))?;

        match shape {
            StoredShape::Envelope(doc) => {
                if doc.schema_version > SCHEMA_VERSION {
                    return Err(DocumentError::UnsupportedSchema {
                        found: doc.schema_version,
                        supported: SCHEMA_VERSION,
                    });
                }
                Ok(doc)
            }
            StoredShape::Listed { projects } => Ok(Self::new(projects, None)),
            StoredShape::Wrapped { data } => Ok(Self::new(data, None)),
            StoredShape::Bare(projects) => Ok(Self::new(projects, None)),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        serde_json::to_vec(self).map_err(|e| DocumentError::Encode(e.to_string()))
    }
}
