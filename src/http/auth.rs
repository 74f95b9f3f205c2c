use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::auth::{AuthGate, Credentials, ADMIN_PASSWORD_HEADER};
use crate::blob::BlobStore;

use super::{ApiError, AppState};

const LOGIN_PATH: &str = "/api/auth";

/// Whether a request must pass the auth gate: any non-safe method under
/// `/api/` except login.
pub(crate) fn is_gated(method: &Method, path: &str) -> bool {
    let safe = matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS);
    !safe && path.starts_with("/api/") && path != LOGIN_PATH
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Middleware: reject gated requests without valid credentials before
/// their body is read.
pub(crate) async fn require_auth(
    State(gate): State<Arc<AuthGate>>,
    request: Request,
    next: Next,
) -> Response {
    if !is_gated(request.method(), request.uri().path()) {
        return next.run(request).await;
    }

    let checked = gate.check(Credentials {
        authorization: header_str(request.headers(), header::AUTHORIZATION.as_str()),
        admin_password: header_str(request.headers(), ADMIN_PASSWORD_HEADER),
    });

    match checked {
        Ok(()) => next.run(request).await,
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// `POST /api/auth` - trade `x-admin-password` for a session token.
pub(crate) async fn login<B: BlobStore + 'static>(
    State(state): State<AppState<B>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let login = state
        .gate
        .login(header_str(&headers, ADMIN_PASSWORD_HEADER))?;

    tracing::info!("admin login");
    let body = match login.token {
        Some(token) => json!({ "success": true, "token": token }),
        None => json!({ "success": true }),
    };
    Ok(Json(body))
}
