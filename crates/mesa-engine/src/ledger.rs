//! # Stock Ledger
//!
//! Per-item locking and transactional stock reservation.
//!
//! ## Locking Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  One async mutex per item ID, created lazily, pruned when idle.         │
//! │                                                                         │
//! │  acquire():  sort IDs ascending → lock each in order, bounded wait     │
//! │              (total order ⇒ no deadlock; timeout ⇒ LockTimeout)        │
//! │  reserve():  under the locks, inside the settlement transaction:       │
//! │              fetch authoritative row → check branch → check stock →    │
//! │              decrement                                                  │
//! │  LockSet:    guards released on drop, after commit or rollback         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The check-then-decrement is race-free because no other settlement can
//! hold the same item's lock, and the decrement itself runs inside the
//! caller's transaction so a later failure rolls it back.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sqlx::SqliteConnection;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::error::{CheckoutError, CheckoutResult};
use crate::repository::item::ItemRepository;
use mesa_core::{CheckoutLine, ResolvedLine, ValidationError};

/// Default bound on how long a settlement waits for one item's lock.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);

/// Serializes stock access per item across concurrent settlements.
#[derive(Debug)]
pub struct StockLedger {
    /// Lazily populated item-ID → lock map.
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,

    /// Bound on the wait for any single item lock.
    lock_wait: Duration,
}

impl Default for StockLedger {
    fn default() -> Self {
        StockLedger::new(DEFAULT_LOCK_WAIT)
    }
}

impl StockLedger {
    /// Creates a ledger with the given per-lock wait bound.
    pub fn new(lock_wait: Duration) -> Self {
        StockLedger {
            locks: Mutex::new(HashMap::new()),
            lock_wait,
        }
    }

    /// Returns the lock for an item, creating it on first use.
    fn lock_for(&self, item_id: &str) -> Arc<AsyncMutex<()>> {
        let mut map = match self.locks.lock() {
            Ok(map) => map,
            // A poisoned map still holds valid Arcs; the () payload
            // carries no invariant to protect.
            Err(poisoned) => poisoned.into_inner(),
        };
        map.entry(item_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Drops lock entries no one holds or is waiting on.
    ///
    /// A strong count of 1 means the map owns the only reference: no
    /// guard is held and no settlement is queued on it. Pruning on every
    /// acquisition keeps the map bounded by the set of items with
    /// in-flight settlements, even when callers name item IDs that do
    /// not exist.
    fn prune_idle(&self) {
        let mut map = match self.locks.lock() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Acquires the locks for every item in the cart.
    ///
    /// IDs are sorted ascending and deduplicated before locking, so any
    /// two settlements contend in the same order. Each individual wait is
    /// bounded by the configured `lock_wait`.
    pub async fn acquire(&self, item_ids: &[String]) -> CheckoutResult<LockSet> {
        self.prune_idle();

        let mut ids: Vec<&String> = item_ids.iter().collect();
        ids.sort();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            let lock = self.lock_for(id);
            match tokio::time::timeout(self.lock_wait, lock.lock_owned()).await {
                Ok(guard) => guards.push(guard),
                Err(_) => {
                    warn!(item_id = %id, wait_ms = self.lock_wait.as_millis() as u64,
                          "Lock wait exceeded bound");
                    // Earlier guards drop here, releasing in reverse order.
                    return Err(CheckoutError::LockTimeout {
                        item_id: id.clone(),
                    });
                }
            }
        }

        debug!(count = guards.len(), "Item locks acquired");
        Ok(LockSet { _guards: guards })
    }

    /// Reserves stock for every cart line inside the settlement
    /// transaction.
    ///
    /// Fails fast on the first offending line:
    /// - unknown item → `NotFound`
    /// - item from another branch → `Validation(BranchMismatch)`
    /// - stock short → `InsufficientStock`
    ///
    /// The caller must hold the [`LockSet`] covering these items. On
    /// success every line's stock has been decremented on `conn`; the
    /// enclosing transaction makes the batch atomic.
    pub async fn reserve(
        &self,
        conn: &mut SqliteConnection,
        branch_id: &str,
        lines: &[CheckoutLine],
    ) -> CheckoutResult<Vec<ResolvedLine>> {
        let mut resolved = Vec::with_capacity(lines.len());

        for line in lines {
            let item = ItemRepository::fetch_in_tx(conn, &line.id)
                .await?
                .ok_or_else(|| CheckoutError::not_found("Item", &line.id))?;

            if item.branch_id != branch_id {
                return Err(ValidationError::BranchMismatch {
                    item_id: item.id,
                    branch_id: branch_id.to_string(),
                }
                .into());
            }

            if item.stock < line.quantity {
                return Err(CheckoutError::InsufficientStock {
                    name: item.name,
                    available: item.stock,
                    requested: line.quantity,
                });
            }

            ItemRepository::decrement_stock_in_tx(conn, &item.id, line.quantity).await?;

            debug!(
                item_id = %item.id,
                quantity = line.quantity,
                remaining = item.stock - line.quantity,
                "Stock reserved"
            );

            resolved.push(ResolvedLine {
                item_id: item.id,
                name: item.name,
                unit_price_cents: item.price_cents,
                quantity: line.quantity,
            });
        }

        Ok(resolved)
    }
}

/// The held locks for one settlement. Dropping releases them.
#[derive(Debug)]
pub struct LockSet {
    _guards: Vec<OwnedMutexGuard<()>>,
}

// =============================================================================
// Unit Tests
// =============================================================================
