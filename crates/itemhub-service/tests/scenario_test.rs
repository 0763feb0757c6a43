//! End-to-end walk through create, rename, duplicate, and delete.

mod helpers;

use itemhub_core::error::ErrorKind;
use itemhub_core::traits::BlobStore;
use itemhub_entity::item::ItemChange;
use itemhub_service::CreateItemRequest;

#[tokio::test]
async fn test_docs_lifecycle() {
    let app = helpers::TestApp::new();

    let docs = app.mkdir("docs", None).await;
    assert_eq!(docs.path, "uploads/docs");

    let a = app.put("a.txt", Some(&docs), "0123456789").await;
    assert_eq!(a.path, "uploads/docs/a.txt");
    assert_eq!(a.size, Some(10));

    let renamed = app
        .service
        .rename_or_move(docs.id, ItemChange::rename("documents"))
        .await
        .unwrap();
    assert_eq!(renamed.path, "uploads/documents");
    assert_eq!(app.reload(&a).await.path, "uploads/documents/a.txt");

    let fresh = app.mkdir("docs", None).await;
    assert_eq!(fresh.path, "uploads/docs");
    let err = app
        .service
        .create_item(CreateItemRequest::directory("documents", None))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let report = app.service.delete_item(docs.id).await.unwrap();
    assert_eq!(report.removed, 2);
    assert_eq!(report.item.path, "uploads/documents");
    assert!(report.blobs.is_complete());

    for id in [docs.id, a.id] {
        let err = app.service.read_item(id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
    let err = app.blobs.get(a.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(app.reload(&fresh).await.path, "uploads/docs");
}

#[tokio::test]
async fn test_second_root_with_same_name_conflicts() {
    let app = helpers::TestApp::new();
    let docs = app.mkdir("docs", None).await;

    let err = app
        .service
        .create_item(CreateItemRequest::directory("docs", None))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let still = app.reload(&docs).await;
    assert_eq!(still, docs);
    assert_eq!(app.service.list_children(None).await.unwrap().len(), 1);
}
