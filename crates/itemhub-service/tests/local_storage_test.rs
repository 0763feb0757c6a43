//! Item service over the local filesystem blob store.

use std::sync::Arc;

use bytes::Bytes;
use itemhub_database::MemoryItemStore;
use itemhub_entity::item::ItemChange;
use itemhub_service::{CreateItemRequest, ItemService, TreeEngine};
use itemhub_storage::providers::LocalBlobStore;

#[tokio::test]
async fn test_blobs_follow_item_lifecycle_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let blobs = LocalBlobStore::new(dir.path().to_str().unwrap())
        .await
        .unwrap();
    let tree = TreeEngine::new(Arc::new(MemoryItemStore::new()), "uploads");
    let service = ItemService::new(tree, Arc::new(blobs));

    let docs = service
        .create_item(CreateItemRequest::directory("docs", None))
        .await
        .unwrap();
    let a = service
        .create_item(CreateItemRequest::file("a.txt", Some(docs.id), "hello"))
        .await
        .unwrap();
    let blob_file = dir.path().join(a.id.to_string());
    assert_eq!(std::fs::read(&blob_file).unwrap(), b"hello");

    // Blobs are keyed by id, so a rename touches no files.
    service
        .rename_or_move(docs.id, ItemChange::rename("documents"))
        .await
        .unwrap();
    assert!(blob_file.exists());
    assert_eq!(
        service.read_content(a.id).await.unwrap(),
        Bytes::from_static(b"hello")
    );

    service.delete_item(docs.id).await.unwrap();
    assert!(!blob_file.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
