//! Materialized path construction and segment-name rules.
//!
//! A path is the namespace root followed by every ancestor name and the
//! item's own name, joined with `/`. Because names never contain `/`, the
//! parent path of any item is recoverable and two distinct placements can
//! never produce the same path.

use itemhub_core::error::AppError;
use itemhub_core::result::AppResult;

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Join a parent path (or the namespace root) with a child name.
pub fn child_path(parent_path: &str, name: &str) -> String {
    format!("{}{SEPARATOR}{name}", parent_path.trim_end_matches(SEPARATOR))
}

/// Compute the path of an item given its parent's path, falling back to the
/// namespace root for root items.
pub fn resolve_path(namespace_root: &str, parent_path: Option<&str>, name: &str) -> String {
    child_path(parent_path.unwrap_or(namespace_root), name)
}

/// Check that a name can be used as a single path segment.
pub fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::invalid_operation("Item name cannot be empty"));
    }
    if name.contains(SEPARATOR) {
        return Err(AppError::invalid_operation(format!(
            "Item name '{name}' must not contain '{SEPARATOR}'"
        )));
    }
    if name == "." || name == ".." {
        return Err(AppError::invalid_operation(format!(
            "Item name '{name}' is reserved"
        )));
    }
    Ok(())
}
