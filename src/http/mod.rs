//! HTTP transport: the config, upload, media and login routes.
//!
//! Requires the `http` feature. Uses axum for routing.
//!
//! ## Routes
//!
//! - `GET /api/config` - current document plus `etag`.
//! - `POST /api/config` - replace the project list (gated, honors `If-Match`).
//! - `POST /api/upload?filename=` - store a media blob (gated).
//! - `GET /api/media/:filename` - serve a media blob.
//! - `POST /api/auth` - trade the admin password for a token.
//! - `GET /health` - `{ "ok": true }`.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use folio_store::{http, AuthGate, ConfigStore, InMemoryBlobStore};
//!
//! let store = Arc::new(ConfigStore::new(InMemoryBlobStore::new()));
//! let state = http::AppState::new(store, gate);
//!
//! // Compose with other axum routes
//! let app = http::router(state.clone());
//!
//! // Or serve directly
//! http::serve(state, "0.0.0.0:8788".parse()?, shutdown_signal()).await?;
//! ```

mod auth;
mod config;
mod error;
mod media;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::auth::AuthGate;
use crate::blob::BlobStore;
use crate::settings::DEFAULT_MAX_UPLOAD_BYTES;
use crate::store::ConfigStore;

pub use error::ApiError;

/// Shared state for every handler.
pub struct AppState<B> {
    pub store: Arc<ConfigStore<B>>,
    pub gate: Arc<AuthGate>,
    pub max_upload_bytes: usize,
}

impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            gate: Arc::clone(&self.gate),
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

impl<B> AppState<B> {
    pub fn new(store: Arc<ConfigStore<B>>, gate: AuthGate) -> Self {
        Self {
            store,
            gate: Arc::new(gate),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, limit: usize) -> Self {
        self.max_upload_bytes = limit;
        self
    }
}

/// Build the axum `Router` for the service.
pub fn router<B: BlobStore + 'static>(state: AppState<B>) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/auth", post(auth::login::<B>))
        .route(
            "/api/config",
            get(config::get_config::<B>).post(config::save_config::<B>),
        )
        .route("/api/upload", post(media::upload::<B>).layer(upload_limit))
        .route("/api/media/:filename", get(media::serve_media::<B>))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.gate),
            auth::require_auth,
        ))
        .with_state(state)
}

/// Serve on `addr` until `shutdown` resolves.
pub async fn serve<B, F>(
    state: AppState<B>,
    addr: SocketAddr,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    B: BlobStore + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// `GET /health`
async fn health_handler() -> Json<Value> {
    Json(json!({ "ok": true }))
}
