//! Item tree structures for hierarchical display.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use itemhub_core::types::ItemId;

use super::model::Item;

/// A node in an item tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemNode {
    /// Item ID.
    pub id: ItemId,
    /// Item name.
    pub name: String,
    /// Full path.
    pub path: String,
    /// Directory flag.
    pub is_dir: bool,
    /// Content size for leaves.
    pub size: Option<i64>,
    /// Child nodes, ordered by name.
    pub children: Vec<ItemNode>,
}

impl ItemNode {
    /// Total number of nodes in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ItemNode::count).sum::<usize>()
    }
}

/// A subtree rooted at one item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemTree {
    /// The root node of the tree.
    pub root: ItemNode,
    /// Total number of items in the tree.
    pub total_items: u64,
}

impl ItemTree {
    /// Build a tree from its root and a flat list of descendants.
    ///
    /// Descendants are indexed by parent id; any row whose parent is not in
    /// the subtree is ignored.
    pub fn build(root: Item, descendants: Vec<Item>) -> Self {
        let mut by_parent: HashMap<ItemId, Vec<Item>> = HashMap::new();
        for item in descendants {
            if let Some(parent_id) = item.parent_id {
                by_parent.entry(parent_id).or_default().push(item);
            }
        }
        for children in by_parent.values_mut() {
            children.sort_by(|a, b| a.name.cmp(&b.name));
        }

        let root = build_node(root, &mut by_parent);
        let total_items = root.count() as u64;
        Self { root, total_items }
    }
}

fn build_node(item: Item, by_parent: &mut HashMap<ItemId, Vec<Item>>) -> ItemNode {
    let children = by_parent
        .remove(&item.id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| build_node(child, by_parent))
        .collect();

    ItemNode {
        id: item.id,
        name: item.name,
        path: item.path,
        is_dir: item.is_dir,
        size: item.size,
        children,
    }
}
