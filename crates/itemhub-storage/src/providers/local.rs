//! Local filesystem blob store.
//!
//! Each blob is one file directly under the root directory, named by the
//! item id. Writes go to a temporary sibling first and are renamed into
//! place, so a reader never observes a partially written blob.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use itemhub_core::error::{AppError, ErrorKind};
use itemhub_core::result::AppResult;
use itemhub_core::traits::BlobStore;
use itemhub_core::types::ItemId;

/// Prefix of in-flight temporary files.
const TEMP_PREFIX: &str = ".tmp-";

/// Local filesystem blob store.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Directory holding every blob.
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a new local blob store rooted at the given path.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create blob root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    fn blob_path(&self, id: ItemId) -> PathBuf {
        self.root.join(id.to_string())
    }

    fn temp_path(&self, id: ItemId) -> PathBuf {
        self.root
            .join(format!("{TEMP_PREFIX}{id}-{}", Uuid::new_v4().simple()))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    async fn put(&self, id: ItemId, data: Bytes) -> AppResult<()> {
        let temp = self.temp_path(id);
        fs::write(&temp, &data).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to write blob {id}"), e)
                .for_item(id)
        })?;

        if let Err(e) = fs::rename(&temp, self.blob_path(id)).await {
            let _ = fs::remove_file(&temp).await;
            return Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to publish blob {id}"),
                e,
            )
            .for_item(id));
        }

        debug!(%id, bytes = data.len(), "Wrote blob");
        Ok(())
    }

    async fn get(&self, id: ItemId) -> AppResult<Bytes> {
        let data = fs::read(self.blob_path(id)).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Blob {id} not found")).for_item(id)
            } else {
                AppError::with_source(ErrorKind::Storage, format!("Failed to read blob {id}"), e)
                    .for_item(id)
            }
        })?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, id: ItemId) -> AppResult<()> {
        match fs::remove_file(self.blob_path(id)).await {
            Ok(()) => {
                debug!(%id, "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete blob {id}"),
                e,
            )
            .for_item(id)),
        }
    }

    async fn exists(&self, id: ItemId) -> AppResult<bool> {
        fs::try_exists(self.blob_path(id)).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to stat blob {id}"), e)
                .for_item(id)
        })
    }

    async fn list_ids(&self) -> AppResult<Vec<ItemId>> {
        let mut dir = fs::read_dir(&self.root).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to list blob root", e)
        })?;

        let mut ids = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read blob directory entry", e)
        })? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(TEMP_PREFIX) {
                continue;
            }
            if let Ok(id) = name.parse::<ItemId>() {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}
