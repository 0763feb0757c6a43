//! Blob store trait for item content backends.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;
use crate::types::ItemId;

/// Trait for content storage backends.
///
/// Blobs are addressed purely by [`ItemId`]; a blob store knows nothing about
/// names, parents, or paths. Implementations live in `itemhub-storage`.
///
/// `put` and `delete` must be idempotent so that a cleanup step can be
/// repeated after a partial failure and converge.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "memory").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Atomically write (or overwrite) the content for `id`.
    async fn put(&self, id: ItemId, data: Bytes) -> AppResult<()>;

    /// Read the content for `id`. Fails with `NotFound` if absent.
    async fn get(&self, id: ItemId) -> AppResult<Bytes>;

    /// Remove the content for `id`. Succeeds if it is already absent.
    async fn delete(&self, id: ItemId) -> AppResult<()>;

    /// Check whether content exists for `id`.
    async fn exists(&self, id: ItemId) -> AppResult<bool>;

    /// List the ids of every stored blob.
    async fn list_ids(&self) -> AppResult<Vec<ItemId>>;
}
