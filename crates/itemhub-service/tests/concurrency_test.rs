//! Concurrent mutations against one tree.

mod helpers;

use std::time::Duration;

use bytes::Bytes;
use helpers::PutPause;
use itemhub_core::error::ErrorKind;
use itemhub_entity::item::{ItemChange, Placement};
use itemhub_service::CreateItemRequest;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_creates_of_same_path_have_one_winner() {
    let app = helpers::TestApp::new();
    let docs = app.mkdir("docs", None).await;

    let mut handles = Vec::new();
    for i in 0..16 {
        let service = app.service.clone();
        let parent_id = docs.id;
        handles.push(tokio::spawn(async move {
            service
                .create_item(CreateItemRequest::file("same.txt", Some(parent_id), format!("{i}")))
                .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(e) => assert_eq!(e.kind, ErrorKind::Conflict),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(app.blobs.len(), 1);
    app.assert_consistent().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_crossing_moves_never_form_a_cycle() {
    let app = helpers::TestApp::new();
    let a = app.mkdir("a", None).await.id;
    let b = app.mkdir("b", None).await.id;

    let move_a = {
        let service = app.service.clone();
        tokio::spawn(async move {
            service
                .rename_or_move(a, ItemChange::move_to(Placement::Directory(b)))
                .await
        })
    };
    let move_b = {
        let service = app.service.clone();
        tokio::spawn(async move {
            service
                .rename_or_move(b, ItemChange::move_to(Placement::Directory(a)))
                .await
        })
    };

    let results = [move_a.await.unwrap(), move_b.await.unwrap()];
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);
    for result in &results {
        if let Err(e) = result {
            assert_eq!(e.kind, ErrorKind::InvalidOperation);
        }
    }
    app.assert_consistent().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_delete_racing_move_into_it() {
    let app = helpers::TestApp::new();
    let target = app.mkdir("target", None).await.id;
    let mover = app.mkdir("mover", None).await;
    let leaf = app.put("x.txt", Some(&mover), "x").await;
    let mover = mover.id;

    let delete = {
        let service = app.service.clone();
        tokio::spawn(async move { service.delete_item(target).await })
    };
    let relocate = {
        let service = app.service.clone();
        tokio::spawn(async move {
            service
                .rename_or_move(mover, ItemChange::move_to(Placement::Directory(target)))
                .await
        })
    };

    let deleted = delete.await.unwrap().unwrap();
    match relocate.await.unwrap() {
        // The move landed first and was deleted along with the target.
        Ok(_) => {
            assert_eq!(deleted.removed, 3);
            assert!(app.service.read_item(leaf.id).await.is_err());
        }
        // The delete landed first and the parent vanished.
        Err(e) => {
            assert_eq!(e.kind, ErrorKind::NotFound);
            assert_eq!(deleted.removed, 1);
            assert_eq!(app.reload(&leaf).await.path, "uploads/mover/x.txt");
        }
    }
    app.assert_consistent().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_disjoint_subtrees_all_succeed() {
    let app = helpers::TestApp::new();
    let mut dirs = Vec::new();
    for i in 0..8 {
        let dir = app.mkdir(&format!("dir{i}"), None).await;
        app.put("file.txt", Some(&dir), "x").await;
        dirs.push(dir);
    }

    let mut handles = Vec::new();
    for dir in &dirs {
        let service = app.service.clone();
        let id = dir.id;
        let name = format!("{}-renamed", dir.name);
        handles.push(tokio::spawn(async move {
            service.rename_or_move(id, ItemChange::rename(name)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for dir in &dirs {
        let children = app.service.list_children(Some(dir.id)).await.unwrap();
        assert_eq!(children[0].path, format!("uploads/{}-renamed/file.txt", dir.name));
    }
    app.assert_consistent().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_replaces_record_size_of_stored_content() {
    let app = helpers::TestApp::new();
    let id = app.put("a.txt", None, "").await.id;

    // The first write lands but is slow to acknowledge.
    app.blobs.pause_next_put(PutPause::AfterWrite);
    let first = {
        let service = app.service.clone();
        tokio::spawn(async move {
            service
                .replace_content(id, Bytes::from_static(b"aaaa"))
                .await
        })
    };
    app.blobs.wait_for_paused_put().await;

    let second = {
        let service = app.service.clone();
        tokio::spawn(async move { service.replace_content(id, Bytes::from_static(b"bb")).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    app.blobs.resume_put();

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    let item = app.service.read_item(id).await.unwrap();
    let content = app.service.read_content(id).await.unwrap();
    assert_eq!(content, Bytes::from_static(b"bb"));
    assert_eq!(item.size, Some(content.len() as i64));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_create_racing_parent_delete_leaves_no_blob() {
    let app = helpers::TestApp::new();
    let docs = app.mkdir("docs", None).await;
    let parent_id = docs.id;

    app.blobs.pause_next_put(PutPause::BeforeWrite);
    let create = {
        let service = app.service.clone();
        tokio::spawn(async move {
            service
                .create_item(CreateItemRequest::file("a.txt", Some(parent_id), "late"))
                .await
        })
    };
    app.blobs.wait_for_paused_put().await;

    let report = app.service.delete_item(parent_id).await.unwrap();
    assert_eq!(report.removed, 2);
    assert!(report.blobs.is_complete());
    app.blobs.resume_put();

    let err = create.await.unwrap().unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(err.item_id.is_some());
    assert_eq!(app.blobs.len(), 0);
    assert!(app.reconcile.sweep(true).await.unwrap().is_consistent());
    app.assert_consistent().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_create_racing_parent_delete_after_write_leaves_no_blob() {
    let app = helpers::TestApp::new();
    let parent_id = app.mkdir("docs", None).await.id;

    app.blobs.pause_next_put(PutPause::AfterWrite);
    let create = {
        let service = app.service.clone();
        tokio::spawn(async move {
            service
                .create_item(CreateItemRequest::file("a.txt", Some(parent_id), "late"))
                .await
        })
    };
    app.blobs.wait_for_paused_put().await;

    app.service.delete_item(parent_id).await.unwrap();
    app.blobs.resume_put();

    let err = create.await.unwrap().unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(app.blobs.len(), 0);
    assert!(app.service.list_all().await.unwrap().is_empty());
}
