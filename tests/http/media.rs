//! `/api/upload` and `/api/media/:filename` over HTTP.

use serde_json::Value;

use folio_store::{content_etag, VersionPolicy};

use crate::support::{bearer_gate, start_server, start_server_with};

#[tokio::test]
async fn upload_then_fetch() {
    let server = start_server().await;
    let bearer = server.bearer().await;

    let resp = server
        .client
        .post(server.url("/api/upload?filename=my%20logo.svg"))
        .header("authorization", &bearer)
        .header("content-type", "image/svg+xml")
        .body("<svg/>")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["filename"], "my_logo.svg");
    assert_eq!(body["url"], "/api/media/my_logo.svg");

    let resp = server
        .client
        .get(server.url("/api/media/my_logo.svg"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "image/svg+xml");
    assert_eq!(
        resp.headers()["etag"].to_str().unwrap(),
        format!("\"{}\"", content_etag(b"<svg/>"))
    );
    assert_eq!(resp.text().await.unwrap(), "<svg/>");
}

#[tokio::test]
async fn upload_without_filename_gets_generated_name() {
    let server = start_server().await;
    let bearer = server.bearer().await;

    let resp = server
        .client
        .post(server.url("/api/upload"))
        .header("authorization", &bearer)
        .body("data")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let filename = body["filename"].as_str().unwrap();
    assert!(filename.starts_with("upload-"));
    assert!(server.blobs.inner.contains(filename));
}

#[tokio::test]
async fn bad_uploads_are_rejected() {
    let server = start_server_with(bearer_gate(), VersionPolicy::Optional, 16).await;
    let bearer = server.bearer().await;

    let resp = server
        .client
        .post(server.url("/api/upload?filename=empty.png"))
        .header("authorization", &bearer)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "No file uploaded");

    let resp = server
        .client
        .post(server.url("/api/upload?filename=portfolio-config.json"))
        .header("authorization", &bearer)
        .body("[]")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = server
        .client
        .post(server.url("/api/upload?filename=big.bin"))
        .header("authorization", &bearer)
        .body(vec![0u8; 64])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 413);

    assert!(!server.blobs.inner.contains("empty.png"));
    assert!(!server.blobs.inner.contains("big.bin"));
}

#[tokio::test]
async fn missing_media_and_config_key_are_not_found() {
    let server = start_server().await;
    let bearer = server.bearer().await;

    server
        .client
        .post(server.url("/api/config"))
        .header("authorization", &bearer)
        .json(&serde_json::json!([]))
        .send()
        .await
        .unwrap();

    for path in ["/api/media/nothing.png", "/api/media/portfolio-config.json"] {
        let resp = server.client.get(server.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), 404, "{path}");
    }
}
