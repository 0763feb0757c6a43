//! Pool for the item metadata database.
//!
//! Every `PgItemStore` handed out by [`DatabasePool::item_store`] shares
//! this pool; each item transaction holds one connection until it commits
//! or rolls back.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

use itemhub_core::config::DatabaseConfig;
use itemhub_core::error::{AppError, ErrorKind};

use crate::repositories::PgItemStore;

#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Open the pool described by the `database` config section.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let url = mask_password(&config.url);
        info!(
            url = %url,
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            acquire_timeout_secs = config.connect_timeout_seconds,
            "Opening item metadata pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to open item metadata pool at {url}: {e}"),
                    e,
                )
            })?;

        info!(url = %url, connections = pool.size(), "Item metadata pool ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// An item store over this pool.
    pub fn item_store(&self) -> PgItemStore {
        debug!(idle = self.pool.num_idle(), "Handing out item store");
        PgItemStore::new(self.pool.clone())
    }

    /// Close the pool, waiting for open item transactions to return their
    /// connections.
    pub async fn close(&self) {
        let connections = self.pool.size();
        self.pool.close().await;
        info!(connections, "Item metadata pool closed");
    }
}

/// Replace the password in a database URL with `****`.
///
/// URLs without a `user:password@` part are returned unchanged.
pub fn mask_password(url: &str) -> String {
    let authority_start = url.find("://").map_or(0, |p| p + 3);
    let Some((credentials, host)) = url[authority_start..].rsplit_once('@') else {
        return url.to_string();
    };
    match credentials.split_once(':') {
        Some((user, _)) => format!("{}{user}:****@{host}", &url[..authority_start]),
        None => url.to_string(),
    }
}
