//! In-process blob store backed by a concurrent map.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use itemhub_core::error::AppError;
use itemhub_core::result::AppResult;
use itemhub_core::traits::BlobStore;
use itemhub_core::types::ItemId;

/// In-memory blob store. Content is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<ItemId, Bytes>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether the store holds no blobs.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn put(&self, id: ItemId, data: Bytes) -> AppResult<()> {
        self.blobs.insert(id, data);
        Ok(())
    }

    async fn get(&self, id: ItemId) -> AppResult<Bytes> {
        self.blobs
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::not_found(format!("Blob {id} not found")).for_item(id))
    }

    async fn delete(&self, id: ItemId) -> AppResult<()> {
        self.blobs.remove(&id);
        Ok(())
    }

    async fn exists(&self, id: ItemId) -> AppResult<bool> {
        Ok(self.blobs.contains_key(&id))
    }

    async fn list_ids(&self) -> AppResult<Vec<ItemId>> {
        Ok(self.blobs.iter().map(|entry| *entry.key()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itemhub_core::error::ErrorKind;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryBlobStore::new();
        let id = ItemId::new();

        store.put(id, Bytes::from_static(b"abc")).await.unwrap();
        assert_eq!(store.get(id).await.unwrap(), Bytes::from_static(b"abc"));
        assert_eq!(store.len(), 1);

        store.delete(id).await.unwrap();
        assert!(store.is_empty());
        store.delete(id).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = MemoryBlobStore::new();
        let err = store.get(ItemId::new()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
