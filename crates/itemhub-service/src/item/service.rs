//! Item operations spanning the metadata tree and the blob store.
//!
//! Metadata always commits first. Blob-side work that fails afterwards is
//! either compensated (create) or reported per id for a later retry
//! (delete); it never rolls metadata back.

use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use itemhub_core::error::{AppError, ErrorKind};
use itemhub_core::result::AppResult;
use itemhub_core::traits::BlobStore;
use itemhub_core::types::ItemId;
use itemhub_entity::item::{CreateItem, Item, ItemChange, ItemTree};
use itemhub_storage::mime_from_path;

use crate::tree::TreeEngine;

/// Blob deletions issued concurrently during a purge.
const PURGE_CONCURRENCY: usize = 8;

/// Request to create a new item.
#[derive(Debug, Clone)]
pub struct CreateItemRequest {
    /// Item name.
    pub name: String,
    /// Whether the item is a directory.
    pub is_dir: bool,
    /// Parent directory ID (None for root-level).
    pub parent_id: Option<ItemId>,
    /// Content for a leaf. A leaf without content gets an empty blob.
    pub content: Option<Bytes>,
}

impl CreateItemRequest {
    /// A directory request.
    pub fn directory(name: impl Into<String>, parent_id: Option<ItemId>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            parent_id,
            content: None,
        }
    }

    /// A leaf request with content.
    pub fn file(
        name: impl Into<String>,
        parent_id: Option<ItemId>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            parent_id,
            content: Some(content.into()),
        }
    }
}

/// A blob that could not be removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobFailure {
    /// The item whose blob is left behind.
    pub item_id: ItemId,
    /// The blob store's error message.
    pub error: String,
}

/// Result of a blob purge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurgeReport {
    /// Blobs confirmed gone.
    pub purged: Vec<ItemId>,
    /// Blobs that are still present or in an unknown state.
    pub failed: Vec<BlobFailure>,
}

impl PurgeReport {
    /// Whether every blob was removed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Ids of the blobs that failed, for a retry.
    pub fn failed_ids(&self) -> Vec<ItemId> {
        self.failed.iter().map(|f| f.item_id).collect()
    }
}

/// Result of deleting an item and its subtree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteReport {
    /// Snapshot of the deleted top-level item.
    pub item: Item,
    /// Number of metadata rows removed.
    pub removed: usize,
    /// Blob cleanup outcome for every leaf in the subtree.
    pub blobs: PurgeReport,
}

/// Creates, reads, moves, and deletes items, keeping leaf content in step
/// with metadata.
#[derive(Debug, Clone)]
pub struct ItemService {
    /// Tree engine.
    tree: TreeEngine,
    /// Blob store.
    blobs: Arc<dyn BlobStore>,
}

impl ItemService {
    /// Creates a new item service.
    pub fn new(tree: TreeEngine, blobs: Arc<dyn BlobStore>) -> Self {
        Self { tree, blobs }
    }

    /// The tree engine.
    pub fn tree(&self) -> &TreeEngine {
        &self.tree
    }

    /// The blob store.
    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    /// Creates an item, storing leaf content under the new id.
    ///
    /// If the blob write fails, the freshly committed row is deleted again
    /// and a `Storage` error carrying the id is returned. If the row was
    /// deleted while the blob was being written, the blob is removed and
    /// `NotFound` is returned.
    pub async fn create_item(&self, req: CreateItemRequest) -> AppResult<Item> {
        if req.is_dir {
            if req.content.is_some() {
                return Err(AppError::invalid_operation(
                    "Directories cannot have content",
                ));
            }
            return self
                .tree
                .create_item(CreateItem::directory(req.name, req.parent_id))
                .await;
        }

        let content = req.content.unwrap_or_default();
        let mimetype = mime_from_path(&req.name);
        let item = self
            .tree
            .create_item(CreateItem::leaf(
                req.name,
                req.parent_id,
                content.len() as i64,
                mimetype,
            ))
            .await?;

        if let Err(e) = self.blobs.put(item.id, content).await {
            warn!(item_id = %item.id, path = %item.path, error = %e, "Blob write failed, removing item");
            if let Err(compensation) = self.tree.delete_subtree(item.id).await {
                if !compensation.is(ErrorKind::NotFound) {
                    warn!(
                        item_id = %item.id,
                        error = %compensation,
                        "Compensating delete failed, item has no content"
                    );
                }
            }
            return Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to store content for '{}'", item.path),
                e,
            )
            .for_item(item.id));
        }

        // A parent deleted between the commit and the put took this row
        // with it, and its purge may have run before the blob landed.
        match self.tree.read_item(item.id).await {
            Err(e) if e.is(ErrorKind::NotFound) => {
                warn!(item_id = %item.id, path = %item.path, "Item deleted while storing content, removing blob");
                if let Err(cleanup) = self.blobs.delete(item.id).await {
                    warn!(item_id = %item.id, error = %cleanup, "Failed to remove blob of deleted item");
                }
                return Err(e.for_item(item.id));
            }
            Err(e) => {
                warn!(item_id = %item.id, error = %e, "Could not confirm item after storing content");
            }
            Ok(_) => {}
        }

        debug!(item_id = %item.id, size = ?item.size, "Stored item content");
        Ok(item)
    }

    /// Gets an item by ID.
    pub async fn read_item(&self, id: ItemId) -> AppResult<Item> {
        self.tree.read_item(id).await
    }

    /// Resolves a materialized path to its item.
    pub async fn resolve_path(&self, path: &str) -> AppResult<Item> {
        self.tree.resolve_path(path).await
    }

    /// Lists the children of a directory, or the root items.
    pub async fn list_children(&self, parent_id: Option<ItemId>) -> AppResult<Vec<Item>> {
        self.tree.list_children(parent_id).await
    }

    /// Lists every item.
    pub async fn list_all(&self) -> AppResult<Vec<Item>> {
        self.tree.list_all().await
    }

    /// Builds the nested tree view rooted at an item.
    pub async fn subtree(&self, id: ItemId) -> AppResult<ItemTree> {
        self.tree.subtree(id).await
    }

    /// Reads a leaf's content.
    pub async fn read_content(&self, id: ItemId) -> AppResult<Bytes> {
        let item = self.tree.read_item(id).await?;
        require_leaf(&item)?;
        self.blobs.get(id).await
    }

    /// Overwrites a leaf's content and records its new size and type.
    ///
    /// The blob is written while the leaf's row is locked, so concurrent
    /// replaces of one item cannot record a size that belongs to another
    /// write.
    pub async fn replace_content(&self, id: ItemId, content: Bytes) -> AppResult<Item> {
        let size = content.len() as i64;
        let blobs = Arc::clone(&self.blobs);
        self.tree
            .update_content_with(id, size, |item| async move {
                blobs.put(item.id, content).await?;
                debug!(item_id = %item.id, size, "Replaced item content");
                Ok(mime_from_path(&item.name))
            })
            .await
    }

    /// Renames and/or moves an item. Content is unaffected since blobs are
    /// keyed by id.
    pub async fn rename_or_move(&self, id: ItemId, change: ItemChange) -> AppResult<Item> {
        self.tree.rename_or_move(id, change).await
    }

    /// Deletes an item and its subtree, then removes the content of every
    /// leaf that was in it.
    ///
    /// Blob failures do not fail the call; they are listed in the report.
    pub async fn delete_item(&self, id: ItemId) -> AppResult<DeleteReport> {
        let deleted = self.tree.delete_subtree(id).await?;
        let blobs = self.purge_blobs(&deleted.leaf_ids()).await;

        if !blobs.is_complete() {
            warn!(
                item_id = %deleted.item.id,
                failed = blobs.failed.len(),
                "Some blobs were not removed after delete"
            );
        }

        Ok(DeleteReport {
            removed: deleted.removed(),
            item: deleted.item,
            blobs,
        })
    }

    /// Deletes the blobs of the given ids. Safe to repeat.
    pub async fn purge_blobs(&self, ids: &[ItemId]) -> PurgeReport {
        purge(self.blobs.as_ref(), ids).await
    }
}

/// Delete each blob, collecting per-id outcomes.
pub(crate) async fn purge(blobs: &dyn BlobStore, ids: &[ItemId]) -> PurgeReport {
    let outcomes: Vec<(ItemId, AppResult<()>)> = futures::stream::iter(ids.iter().copied())
        .map(|id| async move { (id, blobs.delete(id).await) })
        .buffer_unordered(PURGE_CONCURRENCY)
        .collect()
        .await;

    let mut report = PurgeReport::default();
    for (id, outcome) in outcomes {
        match outcome {
            Ok(()) => report.purged.push(id),
            Err(e) => {
                warn!(item_id = %id, error = %e, "Failed to delete blob");
                report.failed.push(BlobFailure {
                    item_id: id,
                    error: e.to_string(),
                });
            }
        }
    }
    info!(
        purged = report.purged.len(),
        failed = report.failed.len(),
        "Blob purge finished"
    );
    report
}

fn require_leaf(item: &Item) -> AppResult<()> {
    if item.is_dir {
        return Err(AppError::invalid_operation(format!(
            "'{}' is a directory and has no content",
            item.path
        )));
    }
    Ok(())
}
