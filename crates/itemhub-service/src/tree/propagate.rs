//! Descendant traversal for path rewrites and subtree deletion.

use tracing::debug;

use itemhub_core::result::AppResult;
use itemhub_core::types::ItemId;
use itemhub_database::ItemTransaction;
use itemhub_entity::item::{Item, child_path};

/// Recompute the path of every descendant of a directory whose own path
/// has already been rewritten to `dir_path`.
///
/// Pre-order over an explicit work-list: a child is rewritten from its
/// parent's new path before any of its own children are visited. Returns
/// the number of rows rewritten.
pub(crate) async fn rewrite_descendant_paths(
    tx: &mut dyn ItemTransaction,
    dir_id: ItemId,
    dir_path: &str,
) -> AppResult<usize> {
    let mut pending = vec![(dir_id, dir_path.to_string())];
    let mut rewritten = 0;

    while let Some((parent_id, parent_path)) = pending.pop() {
        for child in tx.find_children(parent_id).await? {
            let path = child_path(&parent_path, &child.name);
            tx.update_path(child.id, &path).await?;
            debug!(item_id = %child.id, from = %child.path, to = %path, "Rewrote descendant path");
            rewritten += 1;

            if child.is_dir {
                pending.push((child.id, path));
            }
        }
    }

    Ok(rewritten)
}

/// Lock and collect every transitive descendant of `top`.
pub(crate) async fn collect_descendants(
    tx: &mut dyn ItemTransaction,
    top: &Item,
) -> AppResult<Vec<Item>> {
    let mut descendants = Vec::new();
    if !top.is_dir {
        return Ok(descendants);
    }

    let mut pending = vec![top.id];
    while let Some(dir_id) = pending.pop() {
        for child in tx.find_children(dir_id).await? {
            if child.is_dir {
                pending.push(child.id);
            }
            descendants.push(child);
        }
    }
    Ok(descendants)
}
