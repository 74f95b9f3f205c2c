//! Version-checked writes against a shared store.

use std::sync::Arc;

use folio_store::{
    ConfigStore, ProjectRecord, StoreError, VersionPolicy, VersionTag, CONFIG_KEY,
};

use crate::support::RecordingBlobStore;

#[tokio::test]
async fn first_write_with_initial_then_stale_initial_conflicts() {
    let blobs = RecordingBlobStore::new();
    let store = ConfigStore::new(blobs.clone());

    let snapshot = store.read().await.unwrap();
    assert_eq!(snapshot.version, VersionTag::initial());

    let t1 = store
        .write(vec![ProjectRecord::new(1, "A")], Some(&snapshot.version))
        .await
        .unwrap()
        .version;
    assert_ne!(t1, VersionTag::initial());

    let puts_before = blobs.puts();
    let err = store
        .write(vec![ProjectRecord::new(2, "B")], Some(&VersionTag::initial()))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::Conflict {
            expected: VersionTag::initial(),
            actual: t1.clone(),
        }
    );
    assert_eq!(blobs.puts(), puts_before);

    let current = store.read().await.unwrap();
    assert_eq!(current.version, t1);
    assert_eq!(current.document.projects, vec![ProjectRecord::new(1, "A")]);
}

#[tokio::test]
async fn concurrent_writers_with_same_tag_have_one_winner() {
    let store = Arc::new(ConfigStore::new(RecordingBlobStore::new()));
    let base = store.read().await.unwrap().version;

    let mut handles = Vec::new();
    for id in 0..8 {
        let store = store.clone();
        let base = base.clone();
        handles.push(tokio::spawn(async move {
            store
                .write(vec![ProjectRecord::new(id, "racer")], Some(&base))
                .await
        }));
    }

    let mut wins = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(StoreError::Conflict { .. }) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(wins, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test]
async fn tag_is_stable_across_reads() {
    let store = ConfigStore::new(RecordingBlobStore::new());
    let written = store
        .write(vec![ProjectRecord::new(1, "A")], None)
        .await
        .unwrap();

    let first = store.read().await.unwrap();
    let second = store.read().await.unwrap();
    assert_eq!(first.version, written.version);
    assert_eq!(second.version, written.version);
    assert_eq!(first.document, written.document);
}

#[tokio::test]
async fn retrying_the_same_write_reads_back_the_same_list() {
    let store = ConfigStore::new(RecordingBlobStore::new());
    let projects = vec![
        ProjectRecord::new(1, "A").with_image("/api/media/a.png"),
        ProjectRecord::new(2, "B").with_tags(["print"]),
    ];

    let first = store.write(projects.clone(), None).await.unwrap();
    let after_first = store.read().await.unwrap();
    assert_eq!(after_first.version, first.version);
    assert_eq!(after_first.document.projects, projects);

    let second = store.write(projects.clone(), None).await.unwrap();
    let after_second = store.read().await.unwrap();
    assert_eq!(after_second.version, second.version);
    assert_eq!(after_second.document.projects, projects);
    assert!(second.cleanup.deleted.is_empty());
}

#[tokio::test]
async fn required_policy_rejects_before_touching_storage() {
    let blobs = RecordingBlobStore::new();
    let store = ConfigStore::new(blobs.clone()).with_version_policy(VersionPolicy::Required);

    let err = store.write(vec![], None).await.unwrap_err();
    assert_eq!(err, StoreError::VersionRequired);
    assert_eq!(blobs.puts(), 0);
    assert!(!blobs.inner().contains(CONFIG_KEY));
}

#[tokio::test]
async fn storage_failure_is_reported_not_substituted() {
    let blobs = RecordingBlobStore::new();
    let store = ConfigStore::new(blobs.clone());
    store
        .write(vec![ProjectRecord::new(1, "A")], None)
        .await
        .unwrap();

    blobs.set_unavailable(true);
    assert!(matches!(store.read().await, Err(StoreError::Storage(_))));
    assert!(matches!(
        store.write(vec![], None).await,
        Err(StoreError::Storage(_))
    ));

    blobs.set_unavailable(false);
    assert_eq!(store.read().await.unwrap().document.projects.len(), 1);
}
