//! # itemhub-storage
//!
//! Blob store implementations for ItemHub. Content is addressed by item id
//! only; see [`itemhub_core::traits::BlobStore`].

pub mod manager;
pub mod mime;
pub mod providers;

pub use manager::StorageManager;
pub use mime::mime_from_path;
