//! Item repository implementation.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use itemhub_core::error::{AppError, ErrorKind};
use itemhub_core::result::AppResult;
use itemhub_core::types::ItemId;
use itemhub_entity::item::{Item, NewItem};

use crate::store::{ItemStore, ItemTransaction};

/// Check constraint keeping size and mimetype off directories.
const DIR_HAS_NO_CONTENT: &str = "items_dir_has_no_content";
/// SQLSTATE raised by the `items_is_dir_immutable` trigger.
const IS_DIR_IMMUTABLE: &str = "P0001";
/// SQLSTATE for a serialization failure under concurrent writers.
const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE for a detected deadlock between two transactions.
const DEADLOCK_DETECTED: &str = "40P01";

/// PostgreSQL-backed item store.
#[derive(Debug, Clone)]
pub struct PgItemStore {
    pool: PgPool,
}

impl PgItemStore {
    /// Create a new item store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemStore for PgItemStore {
    fn backend(&self) -> &str {
        "postgres"
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }

    async fn begin(&self) -> AppResult<Box<dyn ItemTransaction>> {
        let tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;
        Ok(Box::new(PgItemTransaction { tx }))
    }

    async fn find_by_id(&self, id: ItemId) -> AppResult<Option<Item>> {
        sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find item", e))
    }

    async fn find_by_path(&self, path: &str) -> AppResult<Option<Item>> {
        sqlx::query_as::<_, Item>("SELECT * FROM items WHERE path = $1")
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find item by path", e)
            })
    }

    async fn find_children(&self, parent_id: Option<ItemId>) -> AppResult<Vec<Item>> {
        let query = match parent_id {
            Some(parent_id) => {
                sqlx::query_as::<_, Item>(
                    "SELECT * FROM items WHERE parent_id = $1 ORDER BY name ASC",
                )
                .bind(parent_id)
            }
            None => sqlx::query_as::<_, Item>(
                "SELECT * FROM items WHERE parent_id IS NULL ORDER BY name ASC",
            ),
        };

        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list children", e))
    }

    async fn find_descendants(&self, id: ItemId) -> AppResult<Vec<Item>> {
        sqlx::query_as::<_, Item>(
            "WITH RECURSIVE tree AS ( \
                SELECT * FROM items WHERE id = $1 \
                UNION ALL \
                SELECT i.* FROM items i INNER JOIN tree t ON i.parent_id = t.id \
             ) SELECT * FROM tree WHERE id != $1 ORDER BY path ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list descendants", e))
    }

    async fn find_all(&self) -> AppResult<Vec<Item>> {
        sqlx::query_as::<_, Item>("SELECT * FROM items ORDER BY path ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list items", e))
    }
}

/// An open PostgreSQL transaction over the `items` table.
///
/// Reads take `FOR UPDATE` row locks. Dropping the value without calling
/// [`ItemTransaction::commit`] rolls the transaction back.
pub struct PgItemTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ItemTransaction for PgItemTransaction {
    async fn find_by_id(&mut self, id: ItemId) -> AppResult<Option<Item>> {
        sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_write_error(e, "Failed to lock item", None))
    }

    async fn find_children(&mut self, parent_id: ItemId) -> AppResult<Vec<Item>> {
        sqlx::query_as::<_, Item>(
            "SELECT * FROM items WHERE parent_id = $1 ORDER BY name ASC FOR UPDATE",
        )
        .bind(parent_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "Failed to lock children", None))
    }

    async fn insert(&mut self, item: &NewItem) -> AppResult<Item> {
        sqlx::query_as::<_, Item>(
            "INSERT INTO items (id, name, is_dir, parent_id, path, size, mimetype) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(item.is_dir)
        .bind(item.parent_id)
        .bind(&item.path)
        .bind(item.size)
        .bind(&item.mimetype)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "Failed to create item", Some(&item.path)))
    }

    async fn update_placement(
        &mut self,
        id: ItemId,
        name: &str,
        parent_id: Option<ItemId>,
        path: &str,
    ) -> AppResult<Item> {
        sqlx::query_as::<_, Item>(
            "UPDATE items SET name = $2, parent_id = $3, path = $4, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(parent_id)
        .bind(path)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "Failed to update item", Some(path)))?
        .ok_or_else(|| AppError::not_found(format!("Item {id} not found")))
    }

    async fn update_path(&mut self, id: ItemId, path: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE items SET path = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(path)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_write_error(e, "Failed to rewrite item path", Some(path)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Item {id} not found")));
        }
        Ok(())
    }

    async fn update_content(
        &mut self,
        id: ItemId,
        size: i64,
        mimetype: Option<&str>,
    ) -> AppResult<Item> {
        sqlx::query_as::<_, Item>(
            "UPDATE items SET size = $2, mimetype = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(size)
        .bind(mimetype)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "Failed to update item content", None))?
        .ok_or_else(|| AppError::not_found(format!("Item {id} not found")))
    }

    async fn delete(&mut self, id: ItemId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_write_error(e, "Failed to delete item", None))?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_write_error(e, "Failed to commit transaction", None))
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx.rollback().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to roll back transaction", e)
        })
    }
}

/// Translate a database error raised while writing into the tree's error
/// kinds. Constraint violations carry tree meaning; everything else is a
/// database failure.
fn map_write_error(e: sqlx::Error, context: &str, path: Option<&str>) -> AppError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return match path {
                Some(path) => AppError::conflict(format!("Item path '{path}' already exists")),
                None => AppError::conflict(format!("{context}: duplicate item path")),
            };
        }
        if db_err.is_foreign_key_violation() {
            return AppError::not_found(format!("{context}: parent item does not exist"));
        }
        if db_err.is_check_violation() {
            return match db_err.constraint() {
                Some(DIR_HAS_NO_CONTENT) => AppError::invalid_operation(format!(
                    "{context}: directories cannot carry size or mimetype"
                )),
                Some(constraint) => {
                    AppError::invalid_operation(format!("{context}: violates {constraint}"))
                }
                None => AppError::invalid_operation(format!("{context}: {}", db_err.message())),
            };
        }
        match db_err.code().as_deref() {
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                return AppError::conflict(format!(
                    "{context}: concurrent modification of the same subtree, retry"
                ));
            }
            Some(IS_DIR_IMMUTABLE) => {
                return AppError::invalid_operation(format!("{context}: {}", db_err.message()));
            }
            _ => {}
        }
    }
    AppError::with_source(ErrorKind::Database, context.to_string(), e)
}
