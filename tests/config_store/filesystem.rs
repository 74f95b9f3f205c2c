//! The config store over the filesystem blob store.

use std::sync::Arc;

use folio_store::{
    content_etag, BlobStore, ConfigStore, FileSystemBlobStore, ProjectRecord, StoreError,
    VersionTag, CONFIG_KEY,
};

use crate::support::upload;

#[tokio::test]
async fn document_and_version_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let written = {
        let store = ConfigStore::new(FileSystemBlobStore::open(dir.path()).await.unwrap());
        store
            .write(
                vec![ProjectRecord::new(1, "A").with_tags(["brand"])],
                Some(&VersionTag::initial()),
            )
            .await
            .unwrap()
    };

    let reopened = ConfigStore::new(FileSystemBlobStore::open(dir.path()).await.unwrap());
    let snapshot = reopened.read().await.unwrap();
    assert_eq!(snapshot.version, written.version);
    assert_eq!(snapshot.document, written.document);
}

#[tokio::test]
async fn cleanup_removes_files() {
    let dir = tempfile::tempdir().unwrap();
    let blobs = FileSystemBlobStore::open(dir.path()).await.unwrap();
    upload(&blobs, "x.png").await;
    let store = ConfigStore::new(blobs);

    store
        .write(
            vec![ProjectRecord::new(1, "A").with_image("/api/media/x.png")],
            None,
        )
        .await
        .unwrap();
    assert!(dir.path().join("x.png").exists());

    let outcome = store.write(vec![], None).await.unwrap();
    assert_eq!(outcome.cleanup.deleted, vec!["x.png".to_string()]);
    assert!(!dir.path().join("x.png").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reads_never_mix_revisions_during_writes() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ConfigStore::new(
        FileSystemBlobStore::open(dir.path()).await.unwrap(),
    ));
    store.write(vec![ProjectRecord::new(0, "seed")], None).await.unwrap();

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for id in 1..=300 {
                store
                    .write(vec![ProjectRecord::new(id, "rev")], None)
                    .await
                    .unwrap();
            }
        })
    };

    let mut reads = 0;
    loop {
        let object = store.blobs().get(CONFIG_KEY).await.unwrap().unwrap();
        assert_eq!(content_etag(&object.body), object.meta.etag);

        let snapshot = store.read().await.unwrap();
        assert_eq!(snapshot.document.projects.len(), 1);
        reads += 1;

        if writer.is_finished() {
            break;
        }
        tokio::task::yield_now().await;
    }
    writer.await.unwrap();
    assert!(reads > 0);

    let last = store.read().await.unwrap();
    assert_eq!(last.document.projects[0].id, 300);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_with_same_tag_have_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ConfigStore::new(
        FileSystemBlobStore::open(dir.path()).await.unwrap(),
    ));
    let base = store
        .write(vec![ProjectRecord::new(0, "base")], None)
        .await
        .unwrap()
        .version;

    let mut handles = Vec::new();
    for id in 1..=8 {
        let store = store.clone();
        let base = base.clone();
        handles.push(tokio::spawn(async move {
            store
                .write(vec![ProjectRecord::new(id, "racer")], Some(&base))
                .await
        }));
    }

    let mut winners = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(outcome) => winners.push(outcome),
            Err(StoreError::Conflict { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(winners.len(), 1);
    let snapshot = store.read().await.unwrap();
    assert_eq!(snapshot.version, winners[0].version);
    assert_eq!(snapshot.document.projects, winners[0].document.projects);
}
