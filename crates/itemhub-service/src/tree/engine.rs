//! Tree engine operations.
//!
//! Each mutating operation opens one metadata transaction, performs its
//! invariant checks and every row write inside it, and commits only on
//! success. Any error rolls the whole operation back.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use itemhub_core::config::TreeConfig;
use itemhub_core::error::AppError;
use itemhub_core::result::AppResult;
use itemhub_core::types::ItemId;
use itemhub_database::{ItemStore, ItemTransaction};
use itemhub_entity::item::{CreateItem, Item, ItemChange, ItemTree, resolve_path, validate_name};

use super::guard::{ensure_no_cycle, require_directory, require_item};
use super::propagate::{collect_descendants, rewrite_descendant_paths};

/// Snapshot of a subtree removed by [`TreeEngine::delete_subtree`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedSubtree {
    /// The deleted top-level item, as it was before deletion.
    pub item: Item,
    /// Every transitive descendant that was removed with it.
    pub descendants: Vec<Item>,
}

impl DeletedSubtree {
    /// Ids of every leaf in the removed subtree, the top item included.
    pub fn leaf_ids(&self) -> Vec<ItemId> {
        std::iter::once(&self.item)
            .chain(self.descendants.iter())
            .filter(|item| item.is_leaf())
            .map(|item| item.id)
            .collect()
    }

    /// Number of metadata rows removed.
    pub fn removed(&self) -> usize {
        1 + self.descendants.len()
    }
}

/// Maintains the item tree and its materialized paths.
#[derive(Debug, Clone)]
pub struct TreeEngine {
    /// Metadata store.
    store: Arc<dyn ItemStore>,
    /// Prefix of every root item's path.
    namespace_root: String,
}

impl TreeEngine {
    /// Creates a new tree engine.
    pub fn new(store: Arc<dyn ItemStore>, namespace_root: impl Into<String>) -> Self {
        Self {
            store,
            namespace_root: namespace_root.into(),
        }
    }

    /// Creates a tree engine from the tree configuration section.
    pub fn from_config(store: Arc<dyn ItemStore>, config: &TreeConfig) -> Self {
        Self::new(store, config.namespace_root.clone())
    }

    /// The namespace root paths are built under.
    pub fn namespace_root(&self) -> &str {
        &self.namespace_root
    }

    /// The underlying metadata store.
    pub fn store(&self) -> &Arc<dyn ItemStore> {
        &self.store
    }

    /// Creates an item under a directory or at the root.
    pub async fn create_item(&self, req: CreateItem) -> AppResult<Item> {
        validate_name(&req.name)?;
        if req.is_dir && (req.size.is_some() || req.mimetype.is_some()) {
            return Err(AppError::invalid_operation(
                "Directories cannot carry size or mimetype",
            ));
        }

        let mut tx = self.store.begin().await?;
        let result = self.insert(tx.as_mut(), req).await;
        let item = settle(tx, result).await?;

        info!(item_id = %item.id, path = %item.path, is_dir = item.is_dir, "Item created");
        Ok(item)
    }

    async fn insert(&self, tx: &mut dyn ItemTransaction, req: CreateItem) -> AppResult<Item> {
        let parent_path = match req.parent_id {
            Some(parent_id) => Some(require_directory(tx, parent_id).await?.path),
            None => None,
        };
        let path = resolve_path(&self.namespace_root, parent_path.as_deref(), &req.name);
        tx.insert(&req.into_new_item(ItemId::new(), path)).await
    }

    /// Gets an item by ID.
    pub async fn read_item(&self, id: ItemId) -> AppResult<Item> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Item {id} not found")))
    }

    /// Resolves a materialized path to its item.
    pub async fn resolve_path(&self, path: &str) -> AppResult<Item> {
        self.store
            .find_by_path(path)
            .await?
            .ok_or_else(|| AppError::not_found(format!("No item at path '{path}'")))
    }

    /// Lists the children of a directory, or the root items when `None`.
    pub async fn list_children(&self, parent_id: Option<ItemId>) -> AppResult<Vec<Item>> {
        if let Some(parent_id) = parent_id {
            self.read_item(parent_id).await?;
        }
        self.store.find_children(parent_id).await
    }

    /// Lists every item ordered by path.
    pub async fn list_all(&self) -> AppResult<Vec<Item>> {
        self.store.find_all().await
    }

    /// Builds the nested tree view rooted at an item.
    pub async fn subtree(&self, id: ItemId) -> AppResult<ItemTree> {
        let root = self.read_item(id).await?;
        let descendants = if root.is_dir {
            self.store.find_descendants(id).await?
        } else {
            Vec::new()
        };
        Ok(ItemTree::build(root, descendants))
    }

    /// Renames and/or moves an item, rewriting the path of every descendant.
    ///
    /// An empty change returns the current state unchanged.
    pub async fn rename_or_move(&self, id: ItemId, change: ItemChange) -> AppResult<Item> {
        if let Some(name) = &change.name {
            validate_name(name)?;
        }

        let mut tx = self.store.begin().await?;
        let result = self.apply_change(tx.as_mut(), id, change).await;
        let (item, previous_path, rewritten) = settle(tx, result).await?;

        if item.path != previous_path {
            info!(
                item_id = %item.id,
                from = %previous_path,
                to = %item.path,
                descendants = rewritten,
                "Item renamed or moved"
            );
        }
        Ok(item)
    }

    async fn apply_change(
        &self,
        tx: &mut dyn ItemTransaction,
        id: ItemId,
        change: ItemChange,
    ) -> AppResult<(Item, String, usize)> {
        let current = require_item(tx, id).await?;
        if change.is_empty() {
            let path = current.path.clone();
            return Ok((current, path, 0));
        }

        let name = change.name.unwrap_or_else(|| current.name.clone());
        let parent_id = match change.parent {
            Some(placement) => placement.parent_id(),
            None => current.parent_id,
        };

        let parent_path = match parent_id {
            Some(parent_id) => {
                let parent = require_directory(tx, parent_id).await?;
                if Some(parent_id) != current.parent_id {
                    ensure_no_cycle(tx, &current, &parent).await?;
                }
                Some(parent.path)
            }
            None => None,
        };

        let path = resolve_path(&self.namespace_root, parent_path.as_deref(), &name);
        if path == current.path && parent_id == current.parent_id {
            let previous = current.path.clone();
            return Ok((current, previous, 0));
        }

        let updated = tx.update_placement(id, &name, parent_id, &path).await?;
        let rewritten = if updated.is_dir && updated.path != current.path {
            rewrite_descendant_paths(tx, id, &updated.path).await?
        } else {
            0
        };

        Ok((updated, current.path, rewritten))
    }

    /// Records new content size and type for a leaf.
    pub async fn update_content(
        &self,
        id: ItemId,
        size: i64,
        mimetype: Option<String>,
    ) -> AppResult<Item> {
        self.update_content_with(id, size, |_| async move { Ok(mimetype) })
            .await
    }

    /// Locks a leaf, runs `write` against it, then records the new size and
    /// the mimetype `write` returns, all before the lock is released.
    ///
    /// Concurrent writers to the same leaf are serialized, so the recorded
    /// size always belongs to the content written last.
    pub async fn update_content_with<F, Fut>(
        &self,
        id: ItemId,
        size: i64,
        write: F,
    ) -> AppResult<Item>
    where
        F: FnOnce(Item) -> Fut,
        Fut: Future<Output = AppResult<Option<String>>>,
    {
        let mut tx = self.store.begin().await?;
        let result = async {
            let current = require_item(tx.as_mut(), id).await?;
            if current.is_dir {
                return Err(AppError::invalid_operation(format!(
                    "'{}' is a directory and has no content",
                    current.path
                )));
            }
            let mimetype = write(current).await?;
            tx.update_content(id, size, mimetype.as_deref()).await
        }
        .await;
        let item = settle(tx, result).await?;

        info!(item_id = %item.id, path = %item.path, size, "Item content updated");
        Ok(item)
    }

    /// Deletes an item and its entire subtree in one transaction.
    ///
    /// Returns the removed rows so the caller can clean up leaf content.
    pub async fn delete_subtree(&self, id: ItemId) -> AppResult<DeletedSubtree> {
        let mut tx = self.store.begin().await?;
        let result = async {
            let item = require_item(tx.as_mut(), id).await?;
            let descendants = collect_descendants(tx.as_mut(), &item).await?;
            if !tx.delete(id).await? {
                return Err(AppError::not_found(format!("Item {id} not found")));
            }
            Ok(DeletedSubtree { item, descendants })
        }
        .await;
        let deleted = settle(tx, result).await?;

        info!(
            item_id = %deleted.item.id,
            path = %deleted.item.path,
            removed = deleted.removed(),
            "Item deleted"
        );
        Ok(deleted)
    }
}

/// Commit on success, roll back on failure.
async fn settle<T>(tx: Box<dyn ItemTransaction>, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Failed to roll back transaction");
            }
            Err(e)
        }
    }
}
