use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::blob::BlobStore;
use crate::project::{ConfigDocument, ProjectRecord};
use crate::store::VersionTag;

use super::{ApiError, AppState};

const NO_STORE: &str = "no-store, no-cache, must-revalidate";

#[derive(Serialize)]
struct ConfigBody<'a> {
    #[serde(flatten)]
    document: &'a ConfigDocument,
    etag: &'a VersionTag,
}

fn config_response(document: &ConfigDocument, version: &VersionTag) -> Response {
    let headers = [
        (header::ETAG, version.to_header()),
        (header::CACHE_CONTROL, NO_STORE.to_string()),
    ];
    let body = ConfigBody {
        document,
        etag: version,
    };
    (StatusCode::OK, headers, Json(body)).into_response()
}

/// Decode a save request body: a JSON array of project records.
fn parse_projects(body: &[u8]) -> Result<Vec<ProjectRecord>, ApiError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON: {}", e)))?;
    if !value.is_array() {
        return Err(ApiError::BadRequest("Invalid data format".into()));
    }
    serde_json::from_value(value)
        .map_err(|e| ApiError::BadRequest(format!("Invalid project record: {}", e)))
}

/// `GET /api/config`
pub(crate) async fn get_config<B: BlobStore + 'static>(
    State(state): State<AppState<B>>,
) -> Result<Response, ApiError> {
    let snapshot = state.store.read().await?;
    Ok(config_response(&snapshot.document, &snapshot.version))
}

/// `POST /api/config` - replace the project list, honoring `If-Match`.
pub(crate) async fn save_config<B: BlobStore + 'static>(
    State(state): State<AppState<B>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let if_match = match headers.get(header::IF_MATCH).and_then(|v| v.to_str().ok()) {
        Some(raw) => VersionTag::from_if_match(raw).map_err(ApiError::BadRequest)?,
        None => None,
    };
    let projects = parse_projects(&body?)?;

    let outcome = state.store.write(projects, if_match.as_ref()).await?;
    if !outcome.cleanup.failed.is_empty() {
        tracing::warn!(
            failed = outcome.cleanup.failed.len(),
            "config saved with leftover media"
        );
    }

    Ok(config_response(&outcome.document, &outcome.version))
}
