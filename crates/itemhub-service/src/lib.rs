//! # itemhub-service
//!
//! The tree-consistency engine and the services built on it. The
//! [`TreeEngine`] owns every metadata mutation; [`ItemService`] pairs it
//! with a blob store; [`ReconcileService`] repairs drift between the two.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod item;
pub mod reconcile;
pub mod tree;

pub use item::{BlobFailure, CreateItemRequest, DeleteReport, ItemService, PurgeReport};
pub use reconcile::{ReconcileReport, ReconcileService};
pub use tree::{DeletedSubtree, TreeEngine};
