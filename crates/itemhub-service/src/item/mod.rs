//! Item operations over the tree and the blob store.

pub mod service;

pub use service::{
    BlobFailure, CreateItemRequest, DeleteReport, ItemService, PurgeReport,
};
