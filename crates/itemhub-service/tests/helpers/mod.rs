//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashSet;
use tokio::sync::Notify;

use itemhub_core::error::AppError;
use itemhub_core::result::AppResult;
use itemhub_core::traits::BlobStore;
use itemhub_core::types::ItemId;
use itemhub_database::{ItemStore, MemoryItemStore};
use itemhub_entity::item::Item;
use itemhub_service::{CreateItemRequest, ItemService, ReconcileService, TreeEngine};
use itemhub_storage::providers::MemoryBlobStore;

/// Namespace root used by every test tree.
pub const ROOT: &str = "uploads";

/// Where a paused `put` stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutPause {
    /// Before the bytes are stored.
    BeforeWrite,
    /// After the bytes are stored, before the call returns.
    AfterWrite,
}

/// Blob store that can be told to fail writes or specific deletes, or to
/// hold one write until released.
#[derive(Debug, Default)]
pub struct FaultyBlobStore {
    inner: MemoryBlobStore,
    fail_puts: AtomicBool,
    fail_deletes: DashSet<ItemId>,
    pause_next: Mutex<Option<PutPause>>,
    paused: Notify,
    resume: Notify,
}

impl FaultyBlobStore {
    /// Make every subsequent `put` fail.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Make `delete` fail for one id until cleared.
    pub fn fail_delete_of(&self, id: ItemId) {
        self.fail_deletes.insert(id);
    }

    /// Let every delete succeed again.
    pub fn heal_deletes(&self) {
        self.fail_deletes.clear();
    }

    /// Hold the next `put` at the given point until [`Self::resume_put`].
    pub fn pause_next_put(&self, at: PutPause) {
        *self.pause_next.lock().expect("pause lock") = Some(at);
    }

    /// Wait until the paused `put` has reached its pause point.
    pub async fn wait_for_paused_put(&self) {
        self.paused.notified().await;
    }

    /// Let the paused `put` continue.
    pub fn resume_put(&self) {
        self.resume.notify_one();
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    async fn hold(&self) {
        self.paused.notify_one();
        self.resume.notified().await;
    }
}

#[async_trait]
impl BlobStore for FaultyBlobStore {
    fn provider_type(&self) -> &str {
        "faulty"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn put(&self, id: ItemId, data: Bytes) -> AppResult<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(AppError::storage("injected put failure").for_item(id));
        }
        let pause = self.pause_next.lock().expect("pause lock").take();
        match pause {
            Some(PutPause::BeforeWrite) => {
                self.hold().await;
                self.inner.put(id, data).await
            }
            Some(PutPause::AfterWrite) => {
                self.inner.put(id, data).await?;
                self.hold().await;
                Ok(())
            }
            None => self.inner.put(id, data).await,
        }
    }

    async fn get(&self, id: ItemId) -> AppResult<Bytes> {
        self.inner.get(id).await
    }

    async fn delete(&self, id: ItemId) -> AppResult<()> {
        if self.fail_deletes.contains(&id) {
            return Err(AppError::storage("injected delete failure").for_item(id));
        }
        self.inner.delete(id).await
    }

    async fn exists(&self, id: ItemId) -> AppResult<bool> {
        self.inner.exists(id).await
    }

    async fn list_ids(&self) -> AppResult<Vec<ItemId>> {
        self.inner.list_ids().await
    }
}

/// Test application context
pub struct TestApp {
    /// Item service under test.
    pub service: ItemService,
    /// Reconciliation over the same stores.
    pub reconcile: ReconcileService,
    /// Metadata store, for direct inspection.
    pub store: Arc<MemoryItemStore>,
    /// Blob store, for fault injection and inspection.
    pub blobs: Arc<FaultyBlobStore>,
}

impl TestApp {
    /// Create a new test application over empty in-memory stores.
    pub fn new() -> Self {
        let store = Arc::new(MemoryItemStore::new());
        let blobs = Arc::new(FaultyBlobStore::default());
        let tree = TreeEngine::new(store.clone(), ROOT);
        let service = ItemService::new(tree, blobs.clone());
        let reconcile = ReconcileService::new(store.clone(), blobs.clone());
        Self {
            service,
            reconcile,
            store,
            blobs,
        }
    }

    /// Create a directory, panicking on failure.
    pub async fn mkdir(&self, name: &str, parent: Option<&Item>) -> Item {
        self.service
            .create_item(CreateItemRequest::directory(name, parent.map(|p| p.id)))
            .await
            .expect("Failed to create directory")
    }

    /// Create a leaf with content, panicking on failure.
    pub async fn put(&self, name: &str, parent: Option<&Item>, content: &str) -> Item {
        self.service
            .create_item(CreateItemRequest::file(
                name,
                parent.map(|p| p.id),
                Bytes::copy_from_slice(content.as_bytes()),
            ))
            .await
            .expect("Failed to create file")
    }

    /// Re-read an item by id.
    pub async fn reload(&self, item: &Item) -> Item {
        self.service
            .read_item(item.id)
            .await
            .expect("Item should exist")
    }

    /// Every row as `(id, parent_id, name, path)`, ordered by path.
    pub async fn snapshot(&self) -> Vec<(ItemId, Option<ItemId>, String, String)> {
        self.store
            .find_all()
            .await
            .expect("Failed to list items")
            .into_iter()
            .map(|item| (item.id, item.parent_id, item.name, item.path))
            .collect()
    }

    /// Assert the path and uniqueness invariants over the whole tree.
    pub async fn assert_consistent(&self) {
        let items = self.store.find_all().await.expect("Failed to list items");
        let by_id: HashMap<ItemId, &Item> = items.iter().map(|item| (item.id, item)).collect();

        let mut paths = HashSet::new();
        for item in &items {
            assert!(paths.insert(item.path.clone()), "duplicate path {}", item.path);

            let expected = match item.parent_id {
                Some(parent_id) => {
                    let parent = by_id
                        .get(&parent_id)
                        .unwrap_or_else(|| panic!("{} has a missing parent", item.path));
                    assert!(parent.is_dir, "{} is under a leaf", item.path);
                    format!("{}/{}", parent.path, item.name)
                }
                None => format!("{ROOT}/{}", item.name),
            };
            assert_eq!(item.path, expected, "stale path for {}", item.id);
        }

        for item in &items {
            let mut seen = HashSet::new();
            let mut cursor = item.parent_id;
            while let Some(id) = cursor {
                assert!(seen.insert(id), "cycle through {}", item.path);
                cursor = by_id[&id].parent_id;
            }
        }
    }
}
