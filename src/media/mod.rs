//! Media references - which blobs a project list points at.

use std::collections::BTreeSet;

use crate::project::ProjectRecord;

/// Path prefix under which uploaded blobs are served.
pub const MEDIA_ROUTE_PREFIX: &str = "/api/media/";

/// Collect every non-empty `image` and `video` URL across the records.
pub fn media_refs(projects: &[ProjectRecord]) -> BTreeSet<String> {
    projects
        .iter()
        .flat_map(|p| [p.image.as_deref(), p.video.as_deref()])
        .flatten()
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

/// Blob keys of the internally served media among `refs`.
pub fn media_keys<'a, I>(refs: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    refs.into_iter().filter_map(|url| media_key(url)).collect()
}

/// Map an internally served media URL to its blob key.
///
/// Accepts `/api/media/<key>` and `http(s)://host/api/media/<key>`. Query
/// strings and fragments are ignored. Anything else (external URLs, nested
/// paths, an empty key) yields `None`.
pub fn media_key(url: &str) -> Option<String> {
    let path = match url.split_once("://") {
        Some((scheme, rest)) if scheme == "http" || scheme == "https" => {
            let slash = rest.find('/')?;
            &rest[slash..]
        }
        Some(_) => return None,
        None => url,
    };

    let path = path.split(['?', '#']).next().unwrap_or_default();
    let key = path.strip_prefix(MEDIA_ROUTE_PREFIX)?;

    if key.is_empty() || key.contains('/') {
        return None;
    }
    Some(key.to_string())
}

/// URL an uploaded blob is served from.
pub fn media_url(key: &str) -> String {
    format!("{}{}", MEDIA_ROUTE_PREFIX, key)
}

/// Replace everything outside `[A-Za-z0-9.-]` with `_` and drop leading dots.
///
/// Returns `None` when nothing is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = sanitized.trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}
