//! # Item Repository
//!
//! Database operations for inventory items.
//!
//! The settlement engine does not own items; inventory CRUD lives outside
//! this system. What lives here is exactly what settlement needs: seeding
//! and lookups, the stock-update primitive, and the transaction-scoped
//! fetch/decrement pair the stock ledger runs while holding an item's
//! lock.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use mesa_core::Item;

/// Repository for item database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Inserts an item.
    pub async fn insert(&self, item: &Item) -> DbResult<()> {
        debug!(id = %item.id, name = %item.name, "Inserting item");

        sqlx::query(
            r#"
            INSERT INTO items (id, sku, name, price_cents, stock, branch_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(item.price_cents)
        .bind(item.stock)
        .bind(&item.branch_id)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets an item by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, sku, name, price_cents, stock, branch_id, created_at, updated_at
            FROM items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Lists all items for a branch, ordered by name.
    pub async fn list_for_branch(&self, branch_id: &str) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, sku, name, price_cents, stock, branch_id, created_at, updated_at
            FROM items
            WHERE branch_id = ?1
            ORDER BY name
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Adjusts an item's stock by a delta (the inventory stock-update
    /// primitive; positive for restock, negative for write-offs).
    ///
    /// The guard clause rejects any delta that would drive stock below
    /// zero, atomically within the single UPDATE. Not part of the
    /// settlement path: settlements decrement through
    /// [`ItemRepository::decrement_stock_in_tx`] under the item's lock.
    pub async fn restock(&self, id: &str, delta: i64) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE items SET stock = stock + ?2, updated_at = ?3
            WHERE id = ?1 AND stock + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Zero rows means either no such item or an underflowing
            // delta; a follow-up read disambiguates.
            return match self.get_by_id(id).await? {
                Some(_) => Err(DbError::StockUnderflow { id: id.to_string() }),
                None => Err(DbError::not_found("Item", id)),
            };
        }

        Ok(())
    }

    // =========================================================================
    // Transaction-scoped statements (settlement path)
    // =========================================================================

    /// Fetches an item inside the settlement transaction.
    ///
    /// The caller must hold the item's ledger lock: the row read here is
    /// the authoritative price and stock for the settlement.
    pub async fn fetch_in_tx(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, sku, name, price_cents, stock, branch_id, created_at, updated_at
            FROM items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(item)
    }

    /// Decrements an item's stock inside the settlement transaction.
    ///
    /// The caller must have verified `stock >= qty` under the item's
    /// ledger lock; a rollback of the enclosing transaction reverts this.
    pub async fn decrement_stock_in_tx(
        conn: &mut SqliteConnection,
        id: &str,
        qty: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE items SET stock = stock - ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(qty)
        .bind(now)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn item(id: &str, stock: i64) -> Item {
        let now = Utc::now();
        Item {
            id: id.to_string(),
            sku: None,
            name: format!("Item {}", id),
            price_cents: 500,
            stock,
            branch_id: "branch-1".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_restock_rejects_underflow() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let items = db.items();
        items.insert(&item("i-1", 3)).await.unwrap();

        let err = items.restock("i-1", -5).await.unwrap_err();
        assert!(matches!(err, DbError::StockUnderflow { id } if id == "i-1"));
        assert_eq!(items.get_by_id("i-1").await.unwrap().unwrap().stock, 3);

        // Down to exactly zero is allowed.
        items.restock("i-1", -3).await.unwrap();
        assert_eq!(items.get_by_id("i-1").await.unwrap().unwrap().stock, 0);
    }

    #[tokio::test]
    async fn test_restock_unknown_item_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db.items().restock("ghost", 5).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
