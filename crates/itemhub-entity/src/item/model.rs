//! Item entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use itemhub_core::types::ItemId;

/// A node in the item tree: either a directory or a leaf carrying content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Item {
    /// Unique item identifier, also the key of the item's blob.
    pub id: ItemId,
    /// The item's own segment name.
    pub name: String,
    /// Whether this item is a directory. Never changes after creation.
    pub is_dir: bool,
    /// Parent directory (None for root items).
    pub parent_id: Option<ItemId>,
    /// Full materialized path (e.g., `uploads/docs/a.txt`).
    pub path: String,
    /// Content size in bytes (None for directories).
    pub size: Option<i64>,
    /// Content type (None for directories).
    pub mimetype: Option<String>,
    /// When the item was created.
    pub created_at: DateTime<Utc>,
    /// When the item was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Check if this is a root item (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check if this item is a leaf with blob content.
    pub fn is_leaf(&self) -> bool {
        !self.is_dir
    }
}

/// Data required to insert a new item row.
///
/// The path is computed by the tree engine before insertion; stores persist
/// it verbatim and enforce its uniqueness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    /// Pre-generated identifier.
    pub id: ItemId,
    /// Segment name.
    pub name: String,
    /// Directory flag.
    pub is_dir: bool,
    /// Parent directory (None for root).
    pub parent_id: Option<ItemId>,
    /// Full materialized path.
    pub path: String,
    /// Content size in bytes.
    pub size: Option<i64>,
    /// Content type.
    pub mimetype: Option<String>,
}

/// Request to create an item. The id and path are assigned by the tree
/// engine; content size and type apply to leaves only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateItem {
    /// Segment name.
    pub name: String,
    /// Directory flag.
    pub is_dir: bool,
    /// Parent directory (None for root).
    pub parent_id: Option<ItemId>,
    /// Content size in bytes.
    pub size: Option<i64>,
    /// Content type.
    pub mimetype: Option<String>,
}

impl CreateItem {
    /// A directory with no content.
    pub fn directory(name: impl Into<String>, parent_id: Option<ItemId>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            parent_id,
            size: None,
            mimetype: None,
        }
    }

    /// A leaf with the given content size and type.
    pub fn leaf(
        name: impl Into<String>,
        parent_id: Option<ItemId>,
        size: i64,
        mimetype: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            parent_id,
            size: Some(size),
            mimetype,
        }
    }

    /// Turn the request into an insertable row at the given path.
    pub fn into_new_item(self, id: ItemId, path: String) -> NewItem {
        NewItem {
            id,
            name: self.name,
            is_dir: self.is_dir,
            parent_id: self.parent_id,
            path,
            size: self.size,
            mimetype: self.mimetype,
        }
    }
}

/// Where an item should live after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Placement {
    /// Directly under the namespace root.
    Root,
    /// Under the given directory.
    Directory(ItemId),
}

impl Placement {
    /// The parent id this placement resolves to.
    pub fn parent_id(&self) -> Option<ItemId> {
        match self {
            Self::Root => None,
            Self::Directory(id) => Some(*id),
        }
    }
}

impl From<Option<ItemId>> for Placement {
    fn from(parent_id: Option<ItemId>) -> Self {
        parent_id.map_or(Self::Root, Self::Directory)
    }
}

/// A rename, a move, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemChange {
    /// New segment name, if renaming.
    pub name: Option<String>,
    /// New placement, if moving.
    pub parent: Option<Placement>,
}

impl ItemChange {
    /// A pure rename.
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            parent: None,
        }
    }

    /// A pure move.
    pub fn move_to(parent: Placement) -> Self {
        Self {
            name: None,
            parent: Some(parent),
        }
    }

    /// Set the new name on an existing change.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Whether the change requests nothing at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_from_parent() {
        let id = ItemId::new();
        assert_eq!(Placement::from(Some(id)), Placement::Directory(id));
        assert_eq!(Placement::from(None), Placement::Root);
        assert_eq!(Placement::Directory(id).parent_id(), Some(id));
        assert_eq!(Placement::Root.parent_id(), None);
    }

    #[test]
    fn test_create_item_into_row() {
        let parent = ItemId::new();
        let id = ItemId::new();
        let row = CreateItem::leaf("a.txt", Some(parent), 10, Some("text/plain".into()))
            .into_new_item(id, "uploads/docs/a.txt".into());
        assert_eq!(row.id, id);
        assert_eq!(row.parent_id, Some(parent));
        assert_eq!(row.size, Some(10));
        assert!(!row.is_dir);

        let dir = CreateItem::directory("docs", None);
        assert!(dir.is_dir);
        assert_eq!(dir.size, None);
    }

    #[test]
    fn test_change_builders() {
        assert!(ItemChange::default().is_empty());
        let change = ItemChange::move_to(Placement::Root).with_name("archive");
        assert_eq!(change.name.as_deref(), Some("archive"));
        assert_eq!(change.parent, Some(Placement::Root));
        assert!(!ItemChange::rename("x").is_empty());
    }
}
