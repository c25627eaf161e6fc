//! # Sale Repository
//!
//! Database operations for sales and sale items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A Sale is born COMMITTED or not at all.                                │
//! │                                                                         │
//! │  Inside the coordinator's transaction:                                  │
//! │     insert_sale_in_tx()  → sales row (fully computed totals)           │
//! │     insert_item_in_tx()  → one sale_items row per line                 │
//! │  COMMIT                  → first externally observable moment          │
//! │                                                                         │
//! │  There is no draft state, no totals-update, no void path: a failed     │
//! │  settlement rolls back and leaves zero trace here.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use mesa_core::{Sale, SaleItem};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT
                id, user_id, branch_id, customer_id,
                order_type, table_number, payment_method,
                total_cents, discount_bps, discount_cents, final_total_cents,
                cash_cents, card_cents, created_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all items for a sale, in insertion order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, item_id, name_snapshot, unit_price_cents, quantity, created_at
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists the most recent sales for a user (sale history).
    pub async fn list_for_user(&self, user_id: &str, limit: i64) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT
                id, user_id, branch_id, customer_id,
                order_type, table_number, payment_method,
                total_cents, discount_bps, discount_cents, final_total_cents,
                cash_cents, card_cents, created_at
            FROM sales
            WHERE user_id = ?1
            ORDER BY created_at DESC
            LIMIT ?2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    // =========================================================================
    // Transaction-scoped statements (settlement path)
    // =========================================================================

    /// Inserts the sale header inside the settlement transaction.
    pub async fn insert_sale_in_tx(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, total_cents = sale.total_cents, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, user_id, branch_id, customer_id,
                order_type, table_number, payment_method,
                total_cents, discount_bps, discount_cents, final_total_cents,
                cash_cents, card_cents, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13, ?14
            )
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.user_id)
        .bind(&sale.branch_id)
        .bind(&sale.customer_id)
        .bind(sale.order_type)
        .bind(&sale.table_number)
        .bind(sale.payment_method)
        .bind(sale.total_cents)
        .bind(sale.discount_bps)
        .bind(sale.discount_cents)
        .bind(sale.final_total_cents)
        .bind(sale.cash_cents)
        .bind(sale.card_cents)
        .bind(sale.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Inserts one sale line inside the settlement transaction.
    ///
    /// ## Snapshot Pattern
    /// Name and unit price are copied onto the line, so later item edits
    /// never retroactively alter this sale.
    pub async fn insert_item_in_tx(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, item_id, name_snapshot, unit_price_cents, quantity, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.item_id)
        .bind(&item.name_snapshot)
        .bind(item.unit_price_cents)
        .bind(item.quantity)
        .bind(item.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }
}
