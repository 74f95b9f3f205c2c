use serde::{Deserialize, Serialize};
use std::fmt;

const INITIAL: &str = "initial";
const ANY: &str = "*";

/// Opaque revision of the stored config document.
///
/// Derived from the blob ETag. `"initial"` stands for "nothing stored yet".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionTag(String);

impl VersionTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The tag reported while no document has been stored.
    pub fn initial() -> Self {
        Self(INITIAL.to_string())
    }

    pub fn is_initial(&self) -> bool {
        self.0 == INITIAL
    }

    /// `If-Match: *`: any stored document matches, none stored conflicts.
    pub fn any() -> Self {
        Self(ANY.to_string())
    }

    pub fn is_any(&self) -> bool {
        self.0 == ANY
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse an `If-Match` style header value.
    ///
    /// Accepts quoted or bare tags and strips a weak `W/` prefix. Returns
    /// `None` for blank values.
    pub fn from_header(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let raw = raw.strip_prefix("W/").unwrap_or(raw);
        let raw = raw
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .unwrap_or(raw)
            .trim();

        if raw.is_empty() {
            None
        } else {
            Some(Self(raw.to_string()))
        }
    }

    /// Parse a full `If-Match` header. Tag lists are rejected since a write
    /// is checked against exactly one version.
    pub fn from_if_match(raw: &str) -> Result<Option<Self>, String> {
        if raw.contains(',') {
            return Err(format!("If-Match lists are not supported: {}", raw.trim()));
        }
        Ok(Self::from_header(raw))
    }

    /// Quoted form for an `ETag` header.
    pub fn to_header(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
