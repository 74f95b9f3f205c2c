#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use folio_store::http::{self, AppState};
use folio_store::{
    AuthGate, BlobError, BlobMeta, BlobObject, BlobStore, ConfigStore, InMemoryBlobStore,
    PutCondition, TokenSigner, VersionPolicy,
};

pub const ADMIN_PASSWORD: &str = "correct-horse";
pub const SIGNING_SECRET: &str = "battery-staple-secret";

/// In-memory store that counts every call.
#[derive(Clone, Default)]
pub struct CountingBlobStore {
    pub inner: InMemoryBlobStore,
    calls: Arc<AtomicUsize>,
}

impl CountingBlobStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for CountingBlobStore {
    async fn get(&self, key: &str) -> Result<Option<BlobObject>, BlobError> {
        self.touch();
        self.inner.get(key).await
    }

    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
        condition: PutCondition,
    ) -> Result<BlobMeta, BlobError> {
        self.touch();
        self.inner.put(key, body, content_type, condition).await
    }

    async fn delete(&self, key: &str) -> Result<bool, BlobError> {
        self.touch();
        self.inner.delete(key).await
    }

    async fn list(&self) -> Result<Vec<BlobMeta>, BlobError> {
        self.touch();
        self.inner.list().await
    }
}

pub struct TestServer {
    pub base: String,
    pub blobs: CountingBlobStore,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Log in and return an `Authorization` header value.
    pub async fn bearer(&self) -> String {
        let resp = self
            .client
            .post(self.url("/api/auth"))
            .header("x-admin-password", ADMIN_PASSWORD)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        format!("Bearer {}", body["token"].as_str().unwrap())
    }
}

pub fn bearer_gate() -> AuthGate {
    AuthGate::bearer(
        TokenSigner::new(SIGNING_SECRET, Duration::from_secs(3600)),
        Some(ADMIN_PASSWORD.to_string()),
    )
}

/// Bind to port 0 and return the running server.
pub async fn start_server_with(
    gate: AuthGate,
    policy: VersionPolicy,
    max_upload_bytes: usize,
) -> TestServer {
    let blobs = CountingBlobStore::default();
    let store = Arc::new(ConfigStore::new(blobs.clone()).with_version_policy(policy));
    let state = AppState::new(store, gate).with_max_upload_bytes(max_upload_bytes);
    let app = http::router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("http://{addr}"),
        blobs,
        client: reqwest::Client::new(),
    }
}

pub async fn start_server() -> TestServer {
    start_server_with(bearer_gate(), VersionPolicy::Optional, 1024 * 1024).await
}
