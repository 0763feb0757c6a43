//! Integration tests for cascading delete and blob cleanup.

mod helpers;

use itemhub_core::error::ErrorKind;
use itemhub_core::traits::BlobStore;
use itemhub_core::types::ItemId;

#[tokio::test]
async fn test_directory_delete_removes_rows_and_blobs() {
    let app = helpers::TestApp::new();
    let docs = app.mkdir("docs", None).await;
    let sub = app.mkdir("sub", Some(&docs)).await;
    let empty = app.mkdir("empty", Some(&sub)).await;
    let a = app.put("a.txt", Some(&docs), "a").await;
    let b = app.put("b.txt", Some(&sub), "b").await;
    let keep = app.put("keep.txt", None, "keep").await;

    let report = app.service.delete_item(docs.id).await.unwrap();
    assert_eq!(report.removed, 5);
    assert_eq!(report.item.id, docs.id);
    assert_eq!(report.blobs.purged.len(), 2);
    assert!(report.blobs.is_complete());

    for id in [docs.id, sub.id, empty.id, a.id, b.id] {
        assert_eq!(
            app.service.read_item(id).await.unwrap_err().kind,
            ErrorKind::NotFound
        );
    }
    for id in [a.id, b.id] {
        assert_eq!(app.blobs.get(id).await.unwrap_err().kind, ErrorKind::NotFound);
    }

    assert_eq!(app.reload(&keep).await, keep);
    assert!(app.blobs.exists(keep.id).await.unwrap());
    app.assert_consistent().await;
}

#[tokio::test]
async fn test_leaf_delete() {
    let app = helpers::TestApp::new();
    let docs = app.mkdir("docs", None).await;
    let a = app.put("a.txt", Some(&docs), "a").await;

    let report = app.service.delete_item(a.id).await.unwrap();
    assert_eq!(report.removed, 1);
    assert_eq!(report.blobs.purged, vec![a.id]);
    assert!(!app.blobs.exists(a.id).await.unwrap());
    assert!(app.service.list_children(Some(docs.id)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_missing_is_not_found() {
    let app = helpers::TestApp::new();

    let err = app.service.delete_item(ItemId::new()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_failed_blob_delete_is_reported_not_raised() {
    let app = helpers::TestApp::new();
    let docs = app.mkdir("docs", None).await;
    let a = app.put("a.txt", Some(&docs), "a").await;
    let b = app.put("b.txt", Some(&docs), "b").await;
    app.blobs.fail_delete_of(b.id);

    let report = app.service.delete_item(docs.id).await.unwrap();
    assert_eq!(report.removed, 3);
    assert_eq!(report.blobs.purged, vec![a.id]);
    assert_eq!(report.blobs.failed_ids(), vec![b.id]);

    // Metadata stays deleted; the blob is left behind as garbage.
    assert_eq!(
        app.service.read_item(b.id).await.unwrap_err().kind,
        ErrorKind::NotFound
    );
    assert!(app.blobs.exists(b.id).await.unwrap());

    // Retrying purely on the blob side converges, and repeats are harmless.
    app.blobs.heal_deletes();
    let retry = app.service.purge_blobs(&report.blobs.failed_ids()).await;
    assert!(retry.is_complete());
    assert!(!app.blobs.exists(b.id).await.unwrap());
    let again = app.service.purge_blobs(&[a.id, b.id]).await;
    assert_eq!(again.purged.len(), 2);
}

#[tokio::test]
async fn test_delete_frees_path_for_reuse() {
    let app = helpers::TestApp::new();
    let docs = app.mkdir("docs", None).await;
    app.put("a.txt", Some(&docs), "a").await;

    app.service.delete_item(docs.id).await.unwrap();
    let again = app.mkdir("docs", None).await;

    assert_ne!(again.id, docs.id);
    assert!(app.service.list_children(Some(again.id)).await.unwrap().is_empty());
}
