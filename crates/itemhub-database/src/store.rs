//! Metadata store traits for the item tree.
//!
//! Every mutation of the tree runs inside one [`ItemTransaction`] obtained
//! from [`ItemStore::begin`]. Rows read through a transaction stay locked
//! until it commits or rolls back, so two operations touching overlapping
//! subtrees serialize on those rows while disjoint subtrees proceed in
//! parallel. Dropping a transaction without committing rolls it back.

use async_trait::async_trait;

use itemhub_core::result::AppResult;
use itemhub_core::types::ItemId;
use itemhub_entity::item::{Item, NewItem};

/// A transactional store of item rows.
///
/// The store enforces the relational rules of the table itself: unique
/// paths (`Conflict`), existing parents (`NotFound`), cascading deletes of
/// children, and immutable `is_dir`. Path computation is the caller's job.
#[async_trait]
pub trait ItemStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the backend name (e.g., "postgres", "memory").
    fn backend(&self) -> &str;

    /// Check whether the store is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Open a transaction.
    async fn begin(&self) -> AppResult<Box<dyn ItemTransaction>>;

    /// Find an item by ID.
    async fn find_by_id(&self, id: ItemId) -> AppResult<Option<Item>>;

    /// Find an item by its materialized path.
    async fn find_by_path(&self, path: &str) -> AppResult<Option<Item>>;

    /// List direct children of a directory, or root items when `None`,
    /// ordered by name.
    async fn find_children(&self, parent_id: Option<ItemId>) -> AppResult<Vec<Item>>;

    /// List every transitive descendant of an item (excluding the item
    /// itself), ordered by path.
    async fn find_descendants(&self, id: ItemId) -> AppResult<Vec<Item>>;

    /// List every item ordered by path.
    async fn find_all(&self) -> AppResult<Vec<Item>>;
}

/// One open transaction against an [`ItemStore`].
#[async_trait]
pub trait ItemTransaction: Send {
    /// Find and lock an item by ID.
    async fn find_by_id(&mut self, id: ItemId) -> AppResult<Option<Item>>;

    /// Find and lock the direct children of a directory, ordered by name.
    async fn find_children(&mut self, parent_id: ItemId) -> AppResult<Vec<Item>>;

    /// Insert a new item row.
    async fn insert(&mut self, item: &NewItem) -> AppResult<Item>;

    /// Set an item's name, parent, and path together.
    async fn update_placement(
        &mut self,
        id: ItemId,
        name: &str,
        parent_id: Option<ItemId>,
        path: &str,
    ) -> AppResult<Item>;

    /// Rewrite only an item's path.
    async fn update_path(&mut self, id: ItemId, path: &str) -> AppResult<()>;

    /// Record new content size and type for a leaf.
    async fn update_content(
        &mut self,
        id: ItemId,
        size: i64,
        mimetype: Option<&str>,
    ) -> AppResult<Item>;

    /// Delete an item and, by cascade, all of its descendants.
    /// Returns `false` if the item did not exist.
    async fn delete(&mut self, id: ItemId) -> AppResult<bool>;

    /// Commit all changes.
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// Discard all changes.
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}
