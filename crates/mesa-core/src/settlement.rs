//! # Settlement Calculator
//!
//! Pure, deterministic arithmetic over the resolved cart lines.
//!
//! ## Where This Runs
//! ```text
//! Stock Ledger (locked reads)          THIS MODULE              Coordinator
//! ──────────────────────────           ───────────              ───────────
//! authoritative price + qty  ──►  compute_totals()  ──►  persisted Sale totals
//!                                 verify_split()    ──►  commit or abort
//! ```
//!
//! The calculator only ever sees lines resolved from stored prices while
//! their item locks are held; it never sees client-submitted prices. That
//! is also why the split-tender check lives here and runs inside the
//! atomic scope: the final total it must match depends on the resolved
//! quantities and prices, not on anything the client claimed.
//!
//! ## Rounding
//! Line totals are exact integer cents. Only the discount amount is
//! quantized (half up, at the cent), and the final total is derived by
//! exact subtraction, so `final_total = total - discount_amount` always
//! holds to the cent.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::DiscountRate;
use crate::validation::SplitTender;

// =============================================================================
// Resolved Line
// =============================================================================

/// A cart line after resolution against the stock ledger: authoritative
/// stored price, requested quantity, and the item's display name for
/// receipts and error messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedLine {
    pub item_id: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
}

impl ResolvedLine {
    /// Line total (unit price × quantity), exact.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Settlement Totals
// =============================================================================

/// The derived totals of a settlement.
///
/// ## Invariants
/// - `total_cents == Σ(line.unit_price_cents × line.quantity)`
/// - `discount_cents == round_half_up(total_cents × bps / 10000)`
/// - `final_total_cents == total_cents - discount_cents`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementTotals {
    pub total_cents: i64,
    pub discount_cents: i64,
    pub final_total_cents: i64,
}

/// Computes the settlement totals for a set of resolved lines.
///
/// ## Example
/// ```rust
/// use mesa_core::settlement::{compute_totals, ResolvedLine};
/// use mesa_core::types::DiscountRate;
///
/// let lines = vec![ResolvedLine {
///     item_id: "item-1".into(),
///     name: "Flat White".into(),
///     unit_price_cents: 500,
///     quantity: 3,
/// }];
/// let totals = compute_totals(&lines, DiscountRate::from_bps(1000));
/// assert_eq!(totals.total_cents, 1500);
/// assert_eq!(totals.discount_cents, 150);
/// assert_eq!(totals.final_total_cents, 1350);
/// ```
pub fn compute_totals(lines: &[ResolvedLine], discount: DiscountRate) -> SettlementTotals {
    let total = lines
        .iter()
        .fold(Money::zero(), |acc, line| acc + line.line_total());

    let discount_amount = total.discount_amount(discount);
    let final_total = total - discount_amount;

    SettlementTotals {
        total_cents: total.cents(),
        discount_cents: discount_amount.cents(),
        final_total_cents: final_total.cents(),
    }
}

/// Verifies a split tender against the final total.
///
/// Mixed payment requires `cash + card == final_total` **exactly**; any
/// deviation, even a single cent, fails with
/// [`CoreError::PaymentMismatch`].
pub fn verify_split(final_total_cents: i64, split: &SplitTender) -> CoreResult<()> {
    let tendered = split.total_cents();
    if tendered != final_total_cents {
        return Err(CoreError::PaymentMismatch {
            expected_cents: final_total_cents,
            tendered_cents: tendered,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
