use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::blob::{BlobError, BlobStore, PutCondition};
use crate::media::{media_url, sanitize_filename};
use crate::project::CONFIG_KEY;

use super::{ApiError, AppState};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Deserialize)]
pub(crate) struct UploadParams {
    filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UploadResponse {
    success: bool,
    url: String,
    filename: String,
}

/// Storage key for an upload: the sanitized `filename` parameter, or a
/// timestamped default.
fn upload_key(requested: Option<&str>) -> Result<String, ApiError> {
    let requested = requested.map(str::trim).filter(|name| !name.is_empty());
    let key = match requested {
        Some(name) => sanitize_filename(name)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid filename: {:?}", name)))?,
        None => {
            let millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default();
            format!("upload-{}", millis)
        }
    };

    if key == CONFIG_KEY {
        return Err(ApiError::BadRequest("Reserved filename".into()));
    }
    Ok(key)
}

/// `POST /api/upload?filename=<name>` - store the raw body as a media blob.
pub(crate) async fn upload<B: BlobStore + 'static>(
    State(state): State<AppState<B>>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let key = upload_key(params.filename.as_deref())?;
    let body = body?;
    if body.is_empty() {
        return Err(ApiError::BadRequest("No file uploaded".into()));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE);

    let size = body.len();
    state
        .store
        .blobs()
        .put(&key, body, Some(content_type), PutCondition::None)
        .await?;

    tracing::info!(key = %key, size, content_type, "media uploaded");
    Ok(Json(UploadResponse {
        success: true,
        url: media_url(&key),
        filename: key,
    }))
}

/// `GET /api/media/:filename` - serve a stored media blob.
pub(crate) async fn serve_media<B: BlobStore + 'static>(
    State(state): State<AppState<B>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    if filename == CONFIG_KEY {
        return Err(ApiError::NotFound);
    }

    let object = match state.store.blobs().get(&filename).await {
        Ok(Some(object)) => object,
        Ok(None) | Err(BlobError::InvalidKey(_)) => return Err(ApiError::NotFound),
        Err(e) => return Err(e.into()),
    };

    let content_type = object
        .meta
        .content_type
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
    let headers = [
        (header::CONTENT_TYPE, content_type),
        (header::ETAG, format!("\"{}\"", object.meta.etag)),
    ];
    Ok((headers, object.body).into_response())
}
