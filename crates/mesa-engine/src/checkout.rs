//! # Transaction Coordinator
//!
//! Orchestrates one checkout settlement end to end.
//!
//! ## Settlement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  settle(cashier, request)                               │
//! │                                                                         │
//! │  1. Validate       pure rules (mesa-core), no side effects             │
//! │  2. Resolve        customer must exist (when referenced)               │
//! │  3. Lock           per-item locks in ascending ID order, bounded wait  │
//! │  4. BEGIN ───────────────────────────────────────────────┐             │
//! │  5. Reserve        fetch authoritative rows, decrement   │ one SQLite  │
//! │  6. Calculate      totals, discount, split verification  │ transaction │
//! │  7. Persist        Sale + SaleItems                      │             │
//! │  8. COMMIT ──────────────────────────────────────────────┘             │
//! │  9. Unlock         guards drop                                          │
//! │ 10. Audit          fire-and-forget, post-commit only                    │
//! │                                                                         │
//! │  Any failure before COMMIT drops the transaction ⇒ full rollback:      │
//! │  no Sale, no SaleItems, no stock change, no audit record.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::audit::{AuditEmitter, AuditEvent, TracingAuditEmitter};
use crate::error::{CheckoutResult, DbError};
use crate::ledger::StockLedger;
use crate::pool::Database;
use crate::repository::sale::SaleRepository;
use mesa_core::{
    compute_totals, validate_checkout, verify_split, Cashier, CheckoutIntent, CheckoutRequest,
    PaymentMethod, Sale, SaleItem,
};

/// The caller-facing result of a committed settlement.
///
/// Serializes with snake_case keys, matching the request wire format.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    /// ID of the committed sale.
    pub sale_id: String,

    /// Pre-discount total in cents.
    pub total_cents: i64,

    /// Applied discount as a percentage (display form).
    pub discount_percent: f64,

    /// Discount amount in cents.
    pub discount_cents: i64,

    /// Amount due in cents.
    pub final_total_cents: i64,
}

/// The settlement engine: validation, locking, reservation, persistence
/// and audit behind one entry point.
///
/// Cheap to share via `Arc`; all state is either the pooled database
/// handle or the ledger's interior-mutable lock map.
pub struct CheckoutEngine {
    db: Database,
    ledger: StockLedger,
    audit: Arc<dyn AuditEmitter>,
}

impl CheckoutEngine {
    /// Creates an engine with the default lock wait bound and
    /// tracing-backed audit emission.
    pub fn new(db: Database) -> Self {
        CheckoutEngine {
            db,
            ledger: StockLedger::default(),
            audit: Arc::new(TracingAuditEmitter),
        }
    }

    /// Overrides the per-item lock wait bound.
    pub fn with_lock_wait(mut self, wait: Duration) -> Self {
        self.ledger = StockLedger::new(wait);
        self
    }

    /// Overrides the audit sink.
    pub fn with_audit(mut self, audit: Arc<dyn AuditEmitter>) -> Self {
        self.audit = audit;
        self
    }

    /// Settles one checkout request atomically.
    ///
    /// On `Ok`, the sale is committed and its receipt returned. On `Err`,
    /// nothing happened: no sale rows, no stock movement, no audit record.
    #[instrument(skip(self, request), fields(user_id = %cashier.user_id))]
    pub async fn settle(
        &self,
        cashier: &Cashier,
        request: CheckoutRequest,
    ) -> CheckoutResult<CheckoutReceipt> {
        let intent = validate_checkout(&request, cashier)?;
        debug!(lines = intent.lines.len(), "Checkout request validated");

        if let Some(customer_id) = &intent.customer_id {
            let exists = self.db.customers().exists(customer_id).await?;
            if !exists {
                return Err(crate::error::CheckoutError::not_found(
                    "Customer",
                    customer_id,
                ));
            }
        }

        let item_ids: Vec<String> = intent.lines.iter().map(|l| l.id.clone()).collect();
        let locks = self.ledger.acquire(&item_ids).await?;

        let receipt = self.settle_locked(&intent).await?;

        // Explicit: locks outlive the commit.
        drop(locks);

        self.audit.emit(AuditEvent::sale_created(
            &intent.user_id,
            &receipt.sale_id,
            &intent.branch_id,
            receipt.final_total_cents,
        ));

        info!(
            sale_id = %receipt.sale_id,
            branch_id = %intent.branch_id,
            final_total_cents = receipt.final_total_cents,
            "Sale settled"
        );

        Ok(receipt)
    }

    /// The transactional core, run while holding the item locks.
    ///
    /// A transaction dropped without commit rolls back; every `?` below
    /// therefore leaves the database untouched.
    async fn settle_locked(&self, intent: &CheckoutIntent) -> CheckoutResult<CheckoutReceipt> {
        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let resolved = self
            .ledger
            .reserve(&mut tx, &intent.branch_id, &intent.lines)
            .await?;

        let totals = compute_totals(&resolved, intent.discount);

        let (cash_cents, card_cents) = match (&intent.split, intent.payment_method) {
            (Some(split), PaymentMethod::Mixed) => {
                verify_split(totals.final_total_cents, split)
                    .map_err(crate::error::CheckoutError::from)?;
                (Some(split.cash_cents), Some(split.card_cents))
            }
            _ => (None, None),
        };

        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            user_id: intent.user_id.clone(),
            branch_id: intent.branch_id.clone(),
            customer_id: intent.customer_id.clone(),
            order_type: intent.order_type,
            table_number: intent.table_number.clone(),
            payment_method: intent.payment_method,
            total_cents: totals.total_cents,
            discount_bps: intent.discount.bps() as i64,
            discount_cents: totals.discount_cents,
            final_total_cents: totals.final_total_cents,
            cash_cents,
            card_cents,
            created_at: now,
        };

        SaleRepository::insert_sale_in_tx(&mut tx, &sale).await?;

        for line in &resolved {
            let sale_item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                item_id: line.item_id.clone(),
                name_snapshot: line.name.clone(),
                unit_price_cents: line.unit_price_cents,
                quantity: line.quantity,
                created_at: now,
            };
            SaleRepository::insert_item_in_tx(&mut tx, &sale_item).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(CheckoutReceipt {
            sale_id: sale.id,
            total_cents: totals.total_cents,
            discount_percent: intent.discount.percentage(),
            discount_cents: totals.discount_cents,
            final_total_cents: totals.final_total_cents,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
