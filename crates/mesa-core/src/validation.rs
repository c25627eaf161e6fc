//! # Cart Validator
//!
//! Normalizes and validates an inbound checkout request before any stock
//! is touched.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Wire format (serde)                                           │
//! │  ├── Type checks, unknown enum values, malformed JSON                   │
//! │  └── CheckoutRequest::from_json                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - structural business rules (pure)                │
//! │  ├── Non-empty cart, positive bounded quantities, no duplicate lines    │
//! │  ├── dine-in ⇒ table number, mixed ⇒ both tender amounts               │
//! │  └── discount ∈ [0, 100], cashier has a branch                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Transaction coordinator (mesa-engine)                        │
//! │  ├── Customer existence, item existence, branch match                  │
//! │  └── Stock reservation + settlement math inside the atomic scope       │
//! │                                                                         │
//! │  Defense in depth: each layer catches what the previous one cannot.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Side effects: none. A failed validation leaves zero trace anywhere.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{Cashier, DiscountRate, OrderType, PaymentMethod};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Checkout Request (wire format)
// =============================================================================

/// One requested cart line: an item reference and a quantity.
///
/// No price field on purpose: the engine only ever uses the authoritative
/// stored price, never a client-submitted one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutLine {
    /// Item identifier.
    pub id: String,
    /// Requested quantity (must be a positive integer).
    pub quantity: i64,
}

/// The inbound checkout request, as submitted by a POS client.
///
/// ## Wire Format
/// ```json
/// {
///   "items": [{"id": "…", "quantity": 2}],
///   "customer_id": "…",
///   "order_type": "dine_in",
///   "table_number": "12",
///   "payment_method": "mixed",
///   "discount": 10.0,
///   "cash_cents": 1200,
///   "card_cents": 800
/// }
/// ```
/// `discount` is a percent; all amounts are integer cents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutLine>,
    #[serde(default)]
    pub customer_id: Option<String>,
    pub order_type: OrderType,
    #[serde(default)]
    pub table_number: Option<String>,
    pub payment_method: PaymentMethod,
    /// Discount percent (e.g. `10` or `7.5`). Absent means no discount.
    #[serde(default)]
    pub discount: Option<f64>,
    #[serde(default)]
    pub cash_cents: Option<i64>,
    #[serde(default)]
    pub card_cents: Option<i64>,
}

impl CheckoutRequest {
    /// Parses a checkout request from its JSON wire form.
    pub fn from_json(body: &str) -> ValidationResult<Self> {
        serde_json::from_str(body).map_err(|e| ValidationError::InvalidFormat {
            field: "request".to_string(),
            reason: e.to_string(),
        })
    }
}

// =============================================================================
// Checkout Intent (normalized output)
// =============================================================================

/// A split tender: cash and card portions of a mixed payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitTender {
    pub cash_cents: i64,
    pub card_cents: i64,
}

impl SplitTender {
    /// Total tendered across both instruments.
    #[inline]
    pub fn total_cents(&self) -> i64 {
        self.cash_cents + self.card_cents
    }
}

/// A structurally valid, normalized checkout intent.
///
/// Produced only by [`validate_checkout`]; holding one means every pure
/// rule has passed. Business checks that depend on stored data (customer
/// existence, item lookup, stock) still run inside the atomic scope.
#[derive(Debug, Clone)]
pub struct CheckoutIntent {
    pub user_id: String,
    pub branch_id: String,
    pub customer_id: Option<String>,
    pub order_type: OrderType,
    /// Present iff the order is dine-in (trimmed, non-empty).
    pub table_number: Option<String>,
    pub payment_method: PaymentMethod,
    pub discount: DiscountRate,
    /// Present iff the payment method is mixed.
    pub split: Option<SplitTender>,
    /// Requested lines, in submission order, duplicate-free.
    pub lines: Vec<CheckoutLine>,
}

// =============================================================================
// Validator
// =============================================================================

/// Validates a checkout request against all structural business rules and
/// produces a normalized [`CheckoutIntent`], or fails fast on the first
/// offending field.
///
/// ## Rules
/// - cart is non-empty, at most [`MAX_CART_LINES`] lines
/// - every quantity is a positive integer ≤ [`MAX_LINE_QUANTITY`]
/// - no item id appears on two lines
/// - dine-in requires a non-empty table number; other order types drop it
/// - discount percent is within [0, 100]
/// - mixed payment requires both `cash_cents` and `card_cents`, each
///   non-negative; other methods carry no split fields
/// - the cashier must have an assigned branch
pub fn validate_checkout(
    request: &CheckoutRequest,
    cashier: &Cashier,
) -> ValidationResult<CheckoutIntent> {
    let branch_id = cashier
        .branch_id
        .clone()
        .ok_or_else(|| ValidationError::Required {
            field: "branch".to_string(),
        })?;

    let lines = validate_lines(&request.items)?;
    let table_number = validate_table_number(request.order_type, request.table_number.as_deref())?;
    let discount = parse_discount(request.discount)?;
    let split = validate_split(
        request.payment_method,
        request.cash_cents,
        request.card_cents,
    )?;

    Ok(CheckoutIntent {
        user_id: cashier.user_id.clone(),
        branch_id,
        customer_id: request.customer_id.clone(),
        order_type: request.order_type,
        table_number,
        payment_method: request.payment_method,
        discount,
        split,
        lines,
    })
}

/// Validates cart lines: non-empty, bounded, positive quantities, no
/// duplicate item ids.
fn validate_lines(items: &[CheckoutLine]) -> ValidationResult<Vec<CheckoutLine>> {
    if items.is_empty() {
        return Err(ValidationError::EmptyCart);
    }

    if items.len() > MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_CART_LINES as i64,
        });
    }

    let mut seen: Vec<&str> = Vec::with_capacity(items.len());
    for line in items {
        if line.id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "item id".to_string(),
            });
        }

        if line.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            });
        }

        if line.quantity > MAX_LINE_QUANTITY {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: MAX_LINE_QUANTITY,
            });
        }

        // A duplicate line would try to lock the same stock row twice.
        if seen.contains(&line.id.as_str()) {
            return Err(ValidationError::DuplicateLine {
                item_id: line.id.clone(),
            });
        }
        seen.push(&line.id);
    }

    Ok(items.to_vec())
}

/// Dine-in requires a non-empty table number; other order types never
/// store one.
fn validate_table_number(
    order_type: OrderType,
    table_number: Option<&str>,
) -> ValidationResult<Option<String>> {
    if order_type != OrderType::DineIn {
        return Ok(None);
    }

    match table_number.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(Some(t.to_string())),
        _ => Err(ValidationError::Required {
            field: "table_number".to_string(),
        }),
    }
}

/// Parses the discount percent into a [`DiscountRate`], bounded to
/// [0, 100].
fn parse_discount(discount: Option<f64>) -> ValidationResult<DiscountRate> {
    let pct = match discount {
        None => return Ok(DiscountRate::zero()),
        Some(pct) => pct,
    };

    if !pct.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "discount".to_string(),
            reason: "must be a finite number".to_string(),
        });
    }

    if !(0.0..=100.0).contains(&pct) {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(DiscountRate::from_bps((pct * 100.0).round() as u32))
}

/// Mixed payment requires both tender amounts; other methods carry none.
fn validate_split(
    method: PaymentMethod,
    cash_cents: Option<i64>,
    card_cents: Option<i64>,
) -> ValidationResult<Option<SplitTender>> {
    if method != PaymentMethod::Mixed {
        return Ok(None);
    }

    let cash_cents = cash_cents.ok_or_else(|| ValidationError::Required {
        field: "cash_cents".to_string(),
    })?;
    let card_cents = card_cents.ok_or_else(|| ValidationError::Required {
        field: "card_cents".to_string(),
    })?;

    if cash_cents < 0 || card_cents < 0 {
        return Err(ValidationError::MustBePositive {
            field: "tender amount".to_string(),
        });
    }

    Ok(Some(SplitTender {
        cash_cents,
        card_cents,
    }))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cashier() -> Cashier {
        Cashier::new("user-1", Some("branch-1".to_string()))
    }

    fn basic_request() -> CheckoutRequest {
        CheckoutRequest {
            items: vec![CheckoutLine {
                id: "item-1".to_string(),
                quantity: 2,
            }],
            customer_id: None,
            order_type: OrderType::Takeaway,
            table_number: None,
            payment_method: PaymentMethod::Cash,
            discount: None,
            cash_cents: None,
            card_cents: None,
        }
    }

    #[test]
    fn test_valid_request_normalizes() {
        let intent = validate_checkout(&basic_request(), &cashier()).unwrap();
        assert_eq!(intent.branch_id, "branch-1");
        assert_eq!(intent.lines.len(), 1);
        assert!(intent.discount.is_zero());
        assert!(intent.split.is_none());
        assert!(intent.table_number.is_none());
    }

    #[test]
    fn test_empty_cart_rejected() {
        let mut req = basic_request();
        req.items.clear();
        let err = validate_checkout(&req, &cashier()).unwrap_err();
        assert!(matches!(err, ValidationError::EmptyCart));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let mut req = basic_request();
        req.items[0].quantity = 0;
        let err = validate_checkout(&req, &cashier()).unwrap_err();
        assert!(matches!(err, ValidationError::MustBePositive { .. }));
    }

    #[test]
    fn test_duplicate_line_rejected() {
        let mut req = basic_request();
        req.items.push(CheckoutLine {
            id: "item-1".to_string(),
            quantity: 1,
        });
        let err = validate_checkout(&req, &cashier()).unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateLine { item_id } if item_id == "item-1"));
    }

    #[test]
    fn test_dine_in_requires_table_number() {
        let mut req = basic_request();
        req.order_type = OrderType::DineIn;
        req.table_number = Some("   ".to_string());
        let err = validate_checkout(&req, &cashier()).unwrap_err();
        assert!(matches!(err, ValidationError::Required { field } if field == "table_number"));
    }

    #[test]
    fn test_dine_in_table_number_trimmed() {
        let mut req = basic_request();
        req.order_type = OrderType::DineIn;
        req.table_number = Some(" 12 ".to_string());
        let intent = validate_checkout(&req, &cashier()).unwrap();
        assert_eq!(intent.table_number.as_deref(), Some("12"));
    }

    #[test]
    fn test_takeaway_drops_table_number() {
        let mut req = basic_request();
        req.table_number = Some("12".to_string());
        let intent = validate_checkout(&req, &cashier()).unwrap();
        assert!(intent.table_number.is_none());
    }

    #[test]
    fn test_discount_parsed_to_bps() {
        let mut req = basic_request();
        req.discount = Some(7.5);
        let intent = validate_checkout(&req, &cashier()).unwrap();
        assert_eq!(intent.discount.bps(), 750);
    }

    #[test]
    fn test_discount_over_100_rejected() {
        let mut req = basic_request();
        req.discount = Some(150.0);
        let err = validate_checkout(&req, &cashier()).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { field, .. } if field == "discount"));
    }

    #[test]
    fn test_negative_discount_rejected() {
        let mut req = basic_request();
        req.discount = Some(-5.0);
        assert!(validate_checkout(&req, &cashier()).is_err());
    }

    #[test]
    fn test_mixed_requires_both_amounts() {
        let mut req = basic_request();
        req.payment_method = PaymentMethod::Mixed;
        req.cash_cents = Some(1200);
        let err = validate_checkout(&req, &cashier()).unwrap_err();
        assert!(matches!(err, ValidationError::Required { field } if field == "card_cents"));
    }

    #[test]
    fn test_cash_method_drops_split_fields() {
        let mut req = basic_request();
        req.cash_cents = Some(1200);
        req.card_cents = Some(800);
        let intent = validate_checkout(&req, &cashier()).unwrap();
        assert!(intent.split.is_none());
    }

    #[test]
    fn test_branchless_cashier_rejected() {
        let no_branch = Cashier::new("user-1", None);
        let err = validate_checkout(&basic_request(), &no_branch).unwrap_err();
        assert!(matches!(err, ValidationError::Required { field } if field == "branch"));
    }

    #[test]
    fn test_from_json_roundtrip() {
        let body = r#"{
            "items": [{"id": "item-1", "quantity": 3}],
            "order_type": "dine_in",
            "table_number": "7",
            "payment_method": "mixed",
            "discount": 10,
            "cash_cents": 1200,
            "card_cents": 150
        }"#;
        let req = CheckoutRequest::from_json(body).unwrap();
        assert_eq!(req.items[0].quantity, 3);
        assert_eq!(req.order_type, OrderType::DineIn);
        assert_eq!(req.payment_method, PaymentMethod::Mixed);
    }

    #[test]
    fn test_from_json_rejects_malformed_body() {
        let err = CheckoutRequest::from_json("{not json").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { field, .. } if field == "request"));
    }
}
