//! Invariant checks performed inside a mutating transaction.

use std::collections::HashSet;

use itemhub_core::error::AppError;
use itemhub_core::result::AppResult;
use itemhub_core::types::ItemId;
use itemhub_database::ItemTransaction;
use itemhub_entity::item::Item;

/// Lock and return the item, or fail with `NotFound`.
pub(crate) async fn require_item(tx: &mut dyn ItemTransaction, id: ItemId) -> AppResult<Item> {
    tx.find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Item {id} not found")))
}

/// Lock and return the parent, which must exist and be a directory.
///
/// A leaf parent is reported as `NotFound`: there is no directory with
/// that id.
pub(crate) async fn require_directory(
    tx: &mut dyn ItemTransaction,
    parent_id: ItemId,
) -> AppResult<Item> {
    let parent = tx
        .find_by_id(parent_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Parent item {parent_id} not found")))?;

    if !parent.is_dir {
        return Err(AppError::not_found(format!(
            "Parent item {parent_id} is not a directory"
        )));
    }
    Ok(parent)
}

/// Reject placing `moving` under `new_parent` when `new_parent` is `moving`
/// itself or one of its descendants.
///
/// Walks the ancestor chain of the new parent up to a root, locking each
/// ancestor so the chain cannot change before commit.
pub(crate) async fn ensure_no_cycle(
    tx: &mut dyn ItemTransaction,
    moving: &Item,
    new_parent: &Item,
) -> AppResult<()> {
    if new_parent.id == moving.id {
        return Err(AppError::invalid_operation(format!(
            "Cannot move '{}' into itself",
            moving.path
        )));
    }
    if !moving.is_dir {
        return Ok(());
    }

    let mut seen = HashSet::from([new_parent.id]);
    let mut cursor = new_parent.parent_id;
    while let Some(ancestor_id) = cursor {
        if ancestor_id == moving.id {
            return Err(AppError::invalid_operation(format!(
                "Cannot move '{}' under its own descendant '{}'",
                moving.path, new_parent.path
            )));
        }
        if !seen.insert(ancestor_id) {
            return Err(AppError::internal(format!(
                "Ancestor chain of {} loops at {ancestor_id}",
                new_parent.id
            )));
        }
        cursor = require_item(tx, ancestor_id).await?.parent_id;
    }
    Ok(())
}
