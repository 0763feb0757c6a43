//! Storage manager that dispatches to the configured blob store.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use itemhub_core::config::storage::StorageConfig;
use itemhub_core::error::AppError;
use itemhub_core::result::AppResult;
use itemhub_core::traits::BlobStore;
use itemhub_core::types::ItemId;

/// Storage manager that wraps the configured blob store.
///
/// The provider is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct StorageManager {
    /// The inner blob store.
    inner: Arc<dyn BlobStore>,
}

impl StorageManager {
    /// Create a new storage manager from configuration.
    pub async fn new(config: &StorageConfig) -> AppResult<Self> {
        let inner: Arc<dyn BlobStore> = match config.provider.as_str() {
            #[cfg(feature = "local")]
            "local" => {
                info!(root = %config.local.root_path, "Initializing local blob store");
                Arc::new(crate::providers::LocalBlobStore::new(&config.local.root_path).await?)
            }
            "memory" => {
                info!("Initializing in-memory blob store");
                Arc::new(crate::providers::MemoryBlobStore::new())
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown storage provider: '{other}'. Supported: local, memory"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Create a storage manager from an existing provider (for testing).
    pub fn from_provider(provider: Arc<dyn BlobStore>) -> Self {
        Self { inner: provider }
    }

    /// Get a reference to the inner provider.
    pub fn provider(&self) -> &dyn BlobStore {
        self.inner.as_ref()
    }

    /// Get a shared handle to the inner provider.
    pub fn shared(&self) -> Arc<dyn BlobStore> {
        Arc::clone(&self.inner)
    }
}

#[async_trait]
impl BlobStore for StorageManager {
    fn provider_type(&self) -> &str {
        self.inner.provider_type()
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn put(&self, id: ItemId, data: Bytes) -> AppResult<()> {
        self.inner.put(id, data).await
    }

    async fn get(&self, id: ItemId) -> AppResult<Bytes> {
        self.inner.get(id).await
    }

    async fn delete(&self, id: ItemId) -> AppResult<()> {
        self.inner.delete(id).await
    }

    async fn exists(&self, id: ItemId) -> AppResult<bool> {
        self.inner.exists(id).await
    }

    async fn list_ids(&self) -> AppResult<Vec<ItemId>> {
        self.inner.list_ids().await
    }
}
