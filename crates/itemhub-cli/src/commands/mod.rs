//! CLI command definitions and dispatch.

pub mod config;
pub mod item;
pub mod migrate;
pub mod reconcile;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use itemhub_core::config::AppConfig;
use itemhub_core::error::AppError;
use itemhub_core::traits::BlobStore;
use itemhub_core::types::ItemId;
use itemhub_database::{DatabasePool, ItemStore};
use itemhub_entity::item::Item;
use itemhub_service::{ItemService, ReconcileService, TreeEngine};
use itemhub_storage::StorageManager;
use tracing::debug;

/// ItemHub: consistent item trees over a relational store and a blob store
#[derive(Debug, Parser)]
#[command(name = "itemhub", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Item tree operations
    Item(item::ItemArgs),
    /// Remove orphaned blobs and report leaves missing content
    Reconcile(reconcile::ReconcileArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: Result<AppConfig, AppError>) -> Result<(), AppError> {
        let config = config?;
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &config).await,
            Commands::Item(args) => item::execute(args, &config, self.format).await,
            Commands::Reconcile(args) => reconcile::execute(args, &config, self.format).await,
            Commands::Config(args) => config::execute(args, &config, self.format).await,
        }
    }
}

/// Services wired from configuration.
pub struct AppContext {
    /// Database pool, closed when the command finishes.
    pub pool: DatabasePool,
    /// Item operations.
    pub items: ItemService,
    /// Reconciliation sweep.
    pub reconcile: ReconcileService,
}

impl AppContext {
    /// Connect to the metadata store and the configured blob store.
    pub async fn connect(config: &AppConfig) -> Result<Self, AppError> {
        let pool = DatabasePool::connect(&config.database).await?;
        let store: Arc<dyn ItemStore> = Arc::new(pool.item_store());
        let blobs = StorageManager::new(&config.storage).await?.shared();

        let tree = TreeEngine::from_config(Arc::clone(&store), &config.tree);
        debug!(
            provider = blobs.provider_type(),
            namespace_root = %config.tree.namespace_root,
            "CLI context ready"
        );
        Ok(Self {
            items: ItemService::new(tree, Arc::clone(&blobs)),
            reconcile: ReconcileService::new(store, blobs),
            pool,
        })
    }

    /// Resolve an item reference given as an id or a materialized path.
    pub async fn resolve(&self, reference: &str) -> Result<Item, AppError> {
        match reference.parse::<ItemId>() {
            Ok(id) => self.items.read_item(id).await,
            Err(_) => self.items.resolve_path(reference).await,
        }
    }

    /// Resolve an optional parent reference, which must be a directory.
    pub async fn resolve_parent(&self, reference: Option<&str>) -> Result<Option<ItemId>, AppError> {
        match reference {
            Some(reference) => {
                let parent = self.resolve(reference).await?;
                if !parent.is_dir {
                    return Err(AppError::not_found(format!(
                        "'{}' is not a directory",
                        parent.path
                    )));
                }
                Ok(Some(parent.id))
            }
            None => Ok(None),
        }
    }
}
