//! Error type for HTTP handlers.

use std::error::Error;
use std::fmt;

use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::AuthError;
use crate::blob::BlobError;
use crate::store::{StoreError, VersionTag};

/// Error type for HTTP handlers. Rendered as `{ "error": message }`.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or rejected credentials.
    Unauthorized(String),
    /// Request body or parameters are unusable.
    BadRequest(String),
    /// The caller's version tag is stale. Carries the current tag.
    Conflict { message: String, current: VersionTag },
    /// A version tag is required and was not sent.
    PreconditionRequired(String),
    NotFound,
    PayloadTooLarge(String),
    /// Anything else. The detail is logged, never sent.
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized(msg) => write!(f, "{}", msg),
            ApiError::BadRequest(msg) => write!(f, "{}", msg),
            ApiError::Conflict { message, .. } => write!(f, "{}", message),
            ApiError::PreconditionRequired(msg) => write!(f, "{}", msg),
            ApiError::NotFound => write!(f, "Not Found"),
            ApiError::PayloadTooLarge(msg) => write!(f, "{}", msg),
            ApiError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl Error for ApiError {}

impl ApiError {
    /// Map this error to an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::PreconditionRequired(_) => StatusCode::PRECONDITION_REQUIRED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                json!({ "error": "Internal server error" })
            }
            ApiError::Conflict { current, .. } => {
                json!({ "error": self.to_string(), "etag": current })
            }
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { ref actual, .. } => ApiError::Conflict {
                current: actual.clone(),
                message: err.to_string(),
            },
            StoreError::VersionRequired => ApiError::PreconditionRequired(err.to_string()),
            StoreError::Document(_) | StoreError::Storage(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<BlobError> for ApiError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::InvalidKey(key) => {
                ApiError::BadRequest(format!("Invalid filename: {}", key))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Token(e) => ApiError::Internal(e.to_string()),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge("Payload too large".into())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}
