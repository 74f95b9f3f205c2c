//! Post-write media cleanup and reconciliation.

use std::time::{Duration, SystemTime};

use folio_store::{ConfigStore, ProjectRecord, CONFIG_KEY};

use crate::support::{upload, RecordingBlobStore};

fn with_media(id: i64, image: Option<&str>, video: Option<&str>) -> ProjectRecord {
    let mut record = ProjectRecord::new(id, "p");
    record.image = image.map(str::to_string);
    record.video = video.map(str::to_string);
    record
}

#[tokio::test]
async fn failed_delete_does_not_fail_the_write() {
    let blobs = RecordingBlobStore::new();
    let store = ConfigStore::new(blobs.clone());
    upload(&blobs, "a.png").await;
    upload(&blobs, "b.mp4").await;

    store
        .write(
            vec![with_media(1, Some("/api/media/a.png"), Some("/api/media/b.mp4"))],
            None,
        )
        .await
        .unwrap();

    blobs.fail_delete("a.png");
    let outcome = store.write(vec![], None).await.unwrap();

    assert_eq!(outcome.cleanup.deleted, vec!["b.mp4".to_string()]);
    assert_eq!(outcome.cleanup.failed, vec!["a.png".to_string()]);
    assert!(store.read().await.unwrap().document.projects.is_empty());
    assert!(blobs.inner().contains("a.png"));
    assert!(!blobs.inner().contains("b.mp4"));
}

#[tokio::test]
async fn reconciler_collects_what_cleanup_left_behind() {
    let blobs = RecordingBlobStore::new();
    let store = ConfigStore::new(blobs.clone());
    upload(&blobs, "a.png").await;
    store
        .write(vec![with_media(1, Some("/api/media/a.png"), None)], None)
        .await
        .unwrap();

    blobs.fail_delete("a.png");
    let outcome = store.write(vec![], None).await.unwrap();
    assert_eq!(outcome.cleanup.failed, vec!["a.png".to_string()]);

    let old = SystemTime::now() - Duration::from_secs(7200);
    blobs.inner().set_uploaded_at("a.png", old).unwrap();

    let blocked = store.reconcile_media(Duration::from_secs(3600)).await.unwrap();
    assert_eq!(blocked.failed, vec!["a.png".to_string()]);

    let retry = ConfigStore::new(blobs.inner().clone());
    let report = retry.reconcile_media(Duration::from_secs(3600)).await.unwrap();
    assert_eq!(report.deleted, vec!["a.png".to_string()]);
    assert!(blobs.inner().contains(CONFIG_KEY));
}

#[tokio::test]
async fn absolute_internal_urls_are_cleaned_too() {
    let blobs = RecordingBlobStore::new();
    let store = ConfigStore::new(blobs.clone());
    upload(&blobs, "hero.jpg").await;

    store
        .write(
            vec![with_media(
                1,
                Some("https://folio.example.com/api/media/hero.jpg?v=2"),
                None,
            )],
            None,
        )
        .await
        .unwrap();
    let outcome = store.write(vec![], None).await.unwrap();

    assert_eq!(outcome.cleanup.deleted, vec!["hero.jpg".to_string()]);
}

#[tokio::test]
async fn no_previous_document_means_no_deletes() {
    let blobs = RecordingBlobStore::new();
    let store = ConfigStore::new(blobs.clone());
    upload(&blobs, "a.png").await;

    store.write(vec![], None).await.unwrap();
    assert_eq!(blobs.deletes(), 0);
    assert!(blobs.inner().contains("a.png"));
}
