//! # Domain Types
//!
//! Core domain types for the Mesa POS settlement engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Item       │   │      Sale       │   │    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  price_cents    │   │  total_cents    │   │  sale_id (FK)   │       │
//! │  │  stock          │   │  discount_bps   │   │  unit_price     │       │
//! │  │  branch_id      │   │  final_total    │   │  quantity       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DiscountRate   │   │   OrderType     │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  DineIn         │   │  Cash           │       │
//! │  │  1000 = 10%     │   │  Takeaway       │   │  Card           │       │
//! │  └─────────────────┘   │  Delivery       │   │  Mixed          │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `Sale` and its `SaleItem` lines are created exactly once by the
//! transaction coordinator and are immutable afterwards: there is no edit
//! or void path in this engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Discount Rate
// =============================================================================

/// Discount percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000. A client-facing "7.5%" becomes 750 bps,
/// which keeps all downstream arithmetic in integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// 100% in basis points. Discounts above this are rejected by the
    /// cart validator.
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a discount rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero discount.
    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    /// Checks if the discount is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

// =============================================================================
// Order Type
// =============================================================================

/// How the order is fulfilled.
///
/// Dine-in orders additionally require a table number; the cart validator
/// enforces that pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    DineIn,
    Takeaway,
    Delivery,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the sale is tendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Split tender: cash + card must equal the final total exactly.
    Mixed,
}

// =============================================================================
// Cashier
// =============================================================================

/// The acting user on whose behalf a settlement runs.
///
/// A cashier without an assigned branch cannot check out: the branch is the
/// scoping boundary for every item in the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cashier {
    pub user_id: String,
    pub branch_id: Option<String>,
}

impl Cashier {
    pub fn new(user_id: impl Into<String>, branch_id: Option<String>) -> Self {
        Cashier {
            user_id: user_id.into(),
            branch_id,
        }
    }
}

// =============================================================================
// Item
// =============================================================================

/// An inventory item available for sale.
///
/// The settlement engine references items and mutates their `stock`
/// counter; everything else about an item is owned by inventory CRUD
/// outside this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Optional business identifier (unique when present).
    pub sku: Option<String>,

    /// Display name shown to the cashier and on receipts.
    pub name: String,

    /// Current price in cents. Sales snapshot this at settlement time.
    pub price_cents: i64,

    /// Current stock level. Never driven negative by the engine.
    pub stock: i64,

    /// Branch this item belongs to.
    pub branch_id: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Returns the current price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// An optional customer association. A sale without one is a walk-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub branch_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// A committed, immutable checkout transaction.
///
/// ## Invariants (enforced by the settlement calculator)
/// - `final_total_cents = total_cents - discount_cents`
/// - `discount_cents = round_half_up(total_cents × discount_bps / 10000)`
/// - `total_cents = Σ(line.unit_price_cents × line.quantity)`
/// - `cash_cents`/`card_cents` are present iff `payment_method` is mixed,
///   and then sum exactly to `final_total_cents`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub user_id: String,
    pub branch_id: String,
    pub customer_id: Option<String>,
    pub order_type: OrderType,
    /// Required iff `order_type` is dine-in.
    pub table_number: Option<String>,
    pub payment_method: PaymentMethod,
    /// Pre-discount total.
    pub total_cents: i64,
    /// Discount percentage in basis points.
    pub discount_bps: i64,
    pub discount_cents: i64,
    pub final_total_cents: i64,
    pub cash_cents: Option<i64>,
    pub card_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the pre-discount total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Returns the post-discount total as Money.
    #[inline]
    pub fn final_total(&self) -> Money {
        Money::from_cents(self.final_total_cents)
    }

    /// Returns the discount rate.
    #[inline]
    pub fn discount_rate(&self) -> DiscountRate {
        DiscountRate::from_bps(self.discount_bps as u32)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// One priced, quantified line within a sale.
///
/// Uses the snapshot pattern: name and unit price are frozen at time of
/// sale, so later item edits never retroactively alter historical sales.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub item_id: String,
    /// Item name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Quantity sold (positive).
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line total (unit price × quantity).
    #[inline]
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_rate_from_bps() {
        let rate = DiscountRate::from_bps(750);
        assert_eq!(rate.bps(), 750);
        assert!((rate.percentage() - 7.5).abs() < 0.001);
    }

    #[test]
    fn test_discount_rate_default_is_zero() {
        assert!(DiscountRate::default().is_zero());
    }

    #[test]
    fn test_order_type_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&OrderType::DineIn).unwrap(),
            "\"dine_in\""
        );
        let parsed: OrderType = serde_json::from_str("\"takeaway\"").unwrap();
        assert_eq!(parsed, OrderType::Takeaway);
    }

    #[test]
    fn test_payment_method_serde_snake_case() {
        let parsed: PaymentMethod = serde_json::from_str("\"mixed\"").unwrap();
        assert_eq!(parsed, PaymentMethod::Mixed);
    }

    #[test]
    fn test_sale_item_line_total() {
        let line = SaleItem {
            id: "li-1".to_string(),
            sale_id: "s-1".to_string(),
            item_id: "i-1".to_string(),
            name_snapshot: "Espresso".to_string(),
            unit_price_cents: 350,
            quantity: 4,
            created_at: Utc::now(),
        };
        assert_eq!(line.line_total_cents(), 1400);
    }
}
