//! Core traits defined in `itemhub-core` and implemented by other crates.

pub mod blob;

pub use blob::BlobStore;
