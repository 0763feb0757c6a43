//! The tree-consistency engine: create, rename/move with descendant path
//! propagation, and cascading delete over the metadata store.

pub mod engine;
mod guard;
mod propagate;

pub use engine::{DeletedSubtree, TreeEngine};
