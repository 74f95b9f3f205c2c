//! Auth gate and login over HTTP.

use serde_json::{json, Value};

use folio_store::{AuthGate, VersionPolicy};

use crate::support::{start_server, start_server_with, ADMIN_PASSWORD};

#[tokio::test]
async fn health_is_open() {
    let server = start_server().await;
    let resp = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn unauthenticated_write_never_reaches_storage() {
    let server = start_server().await;

    let resp = server
        .client
        .post(server.url("/api/config"))
        .json(&json!([]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Unauthorized: No token provided");

    let resp = server
        .client
        .post(server.url("/api/upload?filename=a.png"))
        .header("authorization", "Bearer not.a.token")
        .body("bytes")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Unauthorized: Invalid or expired token");

    assert_eq!(server.blobs.calls(), 0);
}

#[tokio::test]
async fn login_issues_a_working_token() {
    let server = start_server().await;
    let bearer = server.bearer().await;

    let resp = server
        .client
        .post(server.url("/api/config"))
        .header("authorization", bearer)
        .json(&json!([]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let server = start_server().await;
    let resp = server
        .client
        .post(server.url("/api/auth"))
        .header("x-admin-password", "guess")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = server.client.post(server.url("/api/auth")).send().await.unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn shared_secret_mode_uses_password_header() {
    let server = start_server_with(
        AuthGate::shared_secret(ADMIN_PASSWORD),
        VersionPolicy::Optional,
        1024,
    )
    .await;

    let resp = server
        .client
        .post(server.url("/api/config"))
        .header("x-admin-password", "wrong-password")
        .json(&json!([]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = server
        .client
        .post(server.url("/api/config"))
        .header("x-admin-password", ADMIN_PASSWORD)
        .json(&json!([]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = server
        .client
        .post(server.url("/api/auth"))
        .header("x-admin-password", ADMIN_PASSWORD)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "success": true }));
}
