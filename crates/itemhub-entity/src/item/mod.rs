//! Item domain entities.

pub mod model;
pub mod path;
pub mod tree;

pub use model::{CreateItem, Item, ItemChange, NewItem, Placement};
pub use path::{child_path, resolve_path, validate_name};
pub use tree::{ItemNode, ItemTree};
