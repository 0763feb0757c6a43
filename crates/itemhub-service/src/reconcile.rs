//! Reconciliation sweep between leaf metadata and stored blobs.
//!
//! Deletes blobs that no leaf row references and reports leaves whose blob
//! is missing. Blob ids are listed before metadata is read: a create
//! commits its row before writing its blob, so every listed blob of a live
//! item has a visible row by the time the rows are read.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use itemhub_core::error::AppError;
use itemhub_core::result::AppResult;
use itemhub_core::traits::BlobStore;
use itemhub_core::types::ItemId;
use itemhub_database::ItemStore;
use itemhub_entity::item::Item;

use crate::item::service::{PurgeReport, purge};

/// Outcome of one reconciliation sweep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Whether the sweep only reported without deleting.
    pub dry_run: bool,
    /// Number of blobs listed.
    pub blobs_scanned: usize,
    /// Number of leaf rows read.
    pub leaves_scanned: usize,
    /// Blobs with no leaf row.
    pub orphaned_blobs: Vec<ItemId>,
    /// Deletion outcome for the orphans (empty on a dry run).
    pub purge: PurgeReport,
    /// Leaves whose blob does not exist.
    pub missing_blobs: Vec<Item>,
}

impl ReconcileReport {
    /// Whether metadata and blobs agree.
    pub fn is_consistent(&self) -> bool {
        self.orphaned_blobs.is_empty() && self.missing_blobs.is_empty()
    }
}

/// Finds and repairs drift between the metadata store and the blob store.
#[derive(Debug, Clone)]
pub struct ReconcileService {
    /// Metadata store.
    store: Arc<dyn ItemStore>,
    /// Blob store.
    blobs: Arc<dyn BlobStore>,
}

impl ReconcileService {
    /// Creates a new reconcile service.
    pub fn new(store: Arc<dyn ItemStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Runs one sweep. With `dry_run`, orphans are reported but kept.
    pub async fn sweep(&self, dry_run: bool) -> AppResult<ReconcileReport> {
        if !self.blobs.health_check().await? {
            return Err(AppError::storage(format!(
                "Blob store '{}' is unavailable",
                self.blobs.provider_type()
            )));
        }

        let blob_ids = self.blobs.list_ids().await?;
        let items = self.store.find_all().await?;

        let leaves: Vec<Item> = items.into_iter().filter(Item::is_leaf).collect();
        let leaf_ids: HashSet<ItemId> = leaves.iter().map(|item| item.id).collect();
        let stored: HashSet<ItemId> = blob_ids.iter().copied().collect();

        let mut orphaned_blobs = Vec::new();
        for id in blob_ids.iter().copied().filter(|id| !leaf_ids.contains(id)) {
            // A row committed after the listing still counts as live.
            match self.store.find_by_id(id).await? {
                Some(item) if item.is_leaf() => {}
                _ => orphaned_blobs.push(id),
            }
        }

        let mut missing_blobs = Vec::new();
        for leaf in leaves.iter().filter(|item| !stored.contains(&item.id)) {
            if !self.blobs.exists(leaf.id).await? {
                missing_blobs.push(leaf.clone());
            }
        }

        let purge = if dry_run {
            PurgeReport::default()
        } else {
            purge(self.blobs.as_ref(), &orphaned_blobs).await
        };

        for leaf in &missing_blobs {
            warn!(item_id = %leaf.id, path = %leaf.path, "Leaf has no blob");
        }
        info!(
            dry_run,
            blobs = blob_ids.len(),
            leaves = leaves.len(),
            orphaned = orphaned_blobs.len(),
            missing = missing_blobs.len(),
            "Reconciliation sweep finished"
        );

        Ok(ReconcileReport {
            dry_run,
            blobs_scanned: blob_ids.len(),
            leaves_scanned: leaves.len(),
            orphaned_blobs,
            purge,
            missing_blobs,
        })
    }
}
