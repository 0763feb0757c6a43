//! In-memory item store.
//!
//! Holds the whole table behind one async mutex. A transaction owns the
//! lock for its lifetime and works on a staged copy that replaces the table
//! on commit, so writers are fully serialized and an abandoned transaction
//! leaves no trace.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use itemhub_core::error::AppError;
use itemhub_core::result::AppResult;
use itemhub_core::types::ItemId;
use itemhub_entity::item::{Item, NewItem};

use crate::store::{ItemStore, ItemTransaction};

/// Rows plus the two indexes the table constraints need.
#[derive(Debug, Clone, Default)]
struct ItemTable {
    items: HashMap<ItemId, Item>,
    /// Unique path index.
    paths: HashMap<String, ItemId>,
    /// Children of each parent; `None` holds the roots.
    children: HashMap<Option<ItemId>, HashSet<ItemId>>,
}

impl ItemTable {
    fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    fn children_of(&self, parent_id: Option<ItemId>) -> Vec<Item> {
        let mut children: Vec<Item> = self
            .children
            .get(&parent_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.items.get(id).cloned())
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        children
    }

    fn claim_path(&mut self, id: ItemId, path: &str) -> AppResult<()> {
        match self.paths.get(path) {
            Some(owner) if *owner != id => {
                Err(AppError::conflict(format!("Item path '{path}' already exists")))
            }
            _ => {
                self.paths.insert(path.to_string(), id);
                Ok(())
            }
        }
    }

    fn require_parent(&self, parent_id: Option<ItemId>) -> AppResult<()> {
        match parent_id {
            Some(parent_id) if !self.items.contains_key(&parent_id) => Err(AppError::not_found(
                format!("Parent item {parent_id} does not exist"),
            )),
            _ => Ok(()),
        }
    }

    fn insert(&mut self, new: &NewItem) -> AppResult<Item> {
        if self.items.contains_key(&new.id) {
            return Err(AppError::conflict(format!("Item {} already exists", new.id)));
        }
        if new.is_dir && (new.size.is_some() || new.mimetype.is_some()) {
            return Err(AppError::invalid_operation(
                "Directories cannot carry size or mimetype",
            ));
        }
        self.require_parent(new.parent_id)?;
        self.claim_path(new.id, &new.path)?;

        let now = Utc::now();
        let item = Item {
            id: new.id,
            name: new.name.clone(),
            is_dir: new.is_dir,
            parent_id: new.parent_id,
            path: new.path.clone(),
            size: new.size,
            mimetype: new.mimetype.clone(),
            created_at: now,
            updated_at: now,
        };
        self.children
            .entry(item.parent_id)
            .or_default()
            .insert(item.id);
        self.items.insert(item.id, item.clone());
        Ok(item)
    }

    fn set_placement(
        &mut self,
        id: ItemId,
        name: &str,
        parent_id: Option<ItemId>,
        path: &str,
    ) -> AppResult<Item> {
        let current = self
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Item {id} not found")))?;
        self.require_parent(parent_id)?;
        self.claim_path(id, path)?;
        if current.path != path {
            self.paths.remove(&current.path);
        }
        if current.parent_id != parent_id {
            if let Some(siblings) = self.children.get_mut(&current.parent_id) {
                siblings.remove(&id);
            }
            self.children.entry(parent_id).or_default().insert(id);
        }

        let item = Item {
            name: name.to_string(),
            parent_id,
            path: path.to_string(),
            updated_at: Utc::now(),
            ..current
        };
        self.items.insert(id, item.clone());
        Ok(item)
    }

    fn set_content(&mut self, id: ItemId, size: i64, mimetype: Option<&str>) -> AppResult<Item> {
        let item = self
            .items
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Item {id} not found")))?;
        if item.is_dir {
            return Err(AppError::invalid_operation(
                "Directories cannot carry size or mimetype",
            ));
        }
        item.size = Some(size);
        item.mimetype = mimetype.map(str::to_string);
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    /// Remove an item and every descendant, like `ON DELETE CASCADE`.
    fn remove_cascade(&mut self, id: ItemId) -> bool {
        let Some(top) = self.items.get(&id) else {
            return false;
        };
        if let Some(siblings) = self.children.get_mut(&top.parent_id) {
            siblings.remove(&id);
        }

        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(children) = self.children.remove(&Some(next)) {
                pending.extend(children);
            }
            if let Some(item) = self.items.remove(&next) {
                self.paths.remove(&item.path);
            }
        }
        true
    }
}

/// In-memory [`ItemStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryItemStore {
    table: Arc<Mutex<ItemTable>>,
}

impl MemoryItemStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn begin(&self) -> AppResult<Box<dyn ItemTransaction>> {
        let guard = Arc::clone(&self.table).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, staged }))
    }

    async fn find_by_id(&self, id: ItemId) -> AppResult<Option<Item>> {
        Ok(self.table.lock().await.get(id).cloned())
    }

    async fn find_by_path(&self, path: &str) -> AppResult<Option<Item>> {
        let table = self.table.lock().await;
        Ok(table.paths.get(path).and_then(|id| table.get(*id)).cloned())
    }

    async fn find_children(&self, parent_id: Option<ItemId>) -> AppResult<Vec<Item>> {
        Ok(self.table.lock().await.children_of(parent_id))
    }

    async fn find_descendants(&self, id: ItemId) -> AppResult<Vec<Item>> {
        let table = self.table.lock().await;
        let mut descendants = Vec::new();
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            for child in table.children_of(Some(next)) {
                pending.push(child.id);
                descendants.push(child);
            }
        }
        descendants.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(descendants)
    }

    async fn find_all(&self) -> AppResult<Vec<Item>> {
        let mut items: Vec<Item> = self.table.lock().await.items.values().cloned().collect();
        items.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(items)
    }
}

/// Transaction over a [`MemoryItemStore`].
struct MemoryTransaction {
    guard: OwnedMutexGuard<ItemTable>,
    staged: ItemTable,
}

#[async_trait]
impl ItemTransaction for MemoryTransaction {
    async fn find_by_id(&mut self, id: ItemId) -> AppResult<Option<Item>> {
        Ok(self.staged.get(id).cloned())
    }

    async fn find_children(&mut self, parent_id: ItemId) -> AppResult<Vec<Item>> {
        Ok(self.staged.children_of(Some(parent_id)))
    }

    async fn insert(&mut self, item: &NewItem) -> AppResult<Item> {
        self.staged.insert(item)
    }

    async fn update_placement(
        &mut self,
        id: ItemId,
        name: &str,
        parent_id: Option<ItemId>,
        path: &str,
    ) -> AppResult<Item> {
        self.staged.set_placement(id, name, parent_id, path)
    }

    async fn update_path(&mut self, id: ItemId, path: &str) -> AppResult<()> {
        let (name, parent_id) = self
            .staged
            .get(id)
            .map(|item| (item.name.clone(), item.parent_id))
            .ok_or_else(|| AppError::not_found(format!("Item {id} not found")))?;
        self.staged.set_placement(id, &name, parent_id, path)?;
        Ok(())
    }

    async fn update_content(
        &mut self,
        id: ItemId,
        size: i64,
        mimetype: Option<&str>,
    ) -> AppResult<Item> {
        self.staged.set_content(id, size, mimetype)
    }

    async fn delete(&mut self, id: ItemId) -> AppResult<bool> {
        Ok(self.staged.remove_cascade(id))
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTransaction { mut guard, staged } = *self;
        debug!(items = staged.items.len(), "Committing in-memory transaction");
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}
