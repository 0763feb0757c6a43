//! Database migration runner.

use sqlx::PgPool;
use tracing::info;

use itemhub_core::error::{AppError, ErrorKind};

/// Run all pending database migrations.
///
/// Creates the `items` table with its path uniqueness constraint, the
/// cascading parent foreign key, and the `is_dir` immutability trigger.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    info!("Running database migrations...");

    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to run migrations: {e}"),
                e,
            )
        })?;

    info!("Database migrations completed successfully");
    Ok(())
}
