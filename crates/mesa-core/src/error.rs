//! # Error Types
//!
//! Domain-specific error types for mesa-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mesa-core errors (this file)                                          │
//! │  ├── CoreError        - Settlement rule violations                     │
//! │  └── ValidationError  - Cart/request validation failures               │
//! │                                                                         │
//! │  mesa-engine errors (separate crate)                                   │
//! │  ├── DbError          - Storage operation failures                     │
//! │  └── CheckoutError    - Full settlement error taxonomy                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → caller            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item name, amounts, field)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Settlement rule violations.
///
/// Every one of these aborts the settlement that raised it; none are
/// partially recovered.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Requested quantity exceeds available stock for a named item.
    ///
    /// Raised during reservation, while the item's lock is held, so
    /// `available` is the authoritative stock at that instant.
    #[error("Insufficient stock for item: {name} (available {available}, requested {requested})")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Split tender does not equal the final total exactly.
    ///
    /// No tolerance: a one-cent deviation is rejected.
    #[error("Cash + Card amount must equal final total (expected {expected_cents}, got {tendered_cents})")]
    PaymentMismatch {
        expected_cents: i64,
        tendered_cents: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Cart/request validation errors.
///
/// These occur before any stock is touched; they are client-correctable
/// and carry the offending field or line.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// The cart has no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// The same item appears on more than one line.
    ///
    /// Duplicate lines would try to lock the same stock row twice; callers
    /// must merge quantities before submitting.
    #[error("Duplicate cart line for item: {item_id}")]
    DuplicateLine { item_id: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (unparseable number, malformed JSON, etc.).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Cross-branch reference: an item belongs to a different branch than
    /// the sale.
    #[error("Item {item_id} does not belong to branch {branch_id}")]
    BranchMismatch { item_id: String, branch_id: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            name: "Margherita".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for item: Margherita (available 3, requested 5)"
        );

        let err = CoreError::PaymentMismatch {
            expected_cents: 2000,
            tendered_cents: 1999,
        };
        assert!(err.to_string().contains("must equal final total"));
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "table_number".to_string(),
        };
        assert_eq!(err.to_string(), "table_number is required");

        assert_eq!(ValidationError::EmptyCart.to_string(), "Cart is empty");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::EmptyCart;
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
