//! # itemhub-database
//!
//! Transactional metadata storage for the item tree: the [`ItemStore`]
//! traits, the PostgreSQL implementation with its pool and migrations, and
//! an in-memory implementation.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::{DatabasePool, mask_password};
pub use memory::MemoryItemStore;
pub use repositories::PgItemStore;
pub use store::{ItemStore, ItemTransaction};
