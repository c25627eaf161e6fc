//! # Engine Error Types
//!
//! Storage errors and the full checkout error taxonomy.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError ← adds context and categorization                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CheckoutError ← the settlement taxonomy the caller sees               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ErrorResponse { "error": "…" } on the wire                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `CheckoutError` aborts the entire settlement atomically: by the
//! time one reaches the caller, no Sale, no SaleItem and no stock mutation
//! survives. Retry policy belongs to the caller; `is_retryable` says which
//! classes are worth retrying.

use serde::Serialize;
use thiserror::Error;

use mesa_core::{CoreError, ValidationError};

// =============================================================================
// Database Error
// =============================================================================

/// Storage operation errors.
///
/// These wrap sqlx errors and add context for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in the database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (duplicate SKU, duplicate phone, ...).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A stock adjustment was rejected because it would drive stock
    /// below zero.
    #[error("Stock for item {id} cannot go below zero")]
    StockUnderflow { id: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction begin/commit failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                //   "UNIQUE constraint failed: <table>.<column>"
                //   "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Checkout Error
// =============================================================================

/// The settlement error taxonomy.
///
/// Variants map one-to-one onto the failure classes a caller must
/// distinguish; [`CheckoutError::code`] gives the machine-readable class.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Malformed or out-of-range request fields (empty cart, missing table
    /// number for dine-in, discount out of bounds, ...).
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Unknown item or customer.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Requested quantity exceeds available stock for a named item.
    #[error("Insufficient stock for item: {name} (available {available}, requested {requested})")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Split payment does not exactly equal the final total.
    #[error("Cash + Card amount must equal final total (expected {expected_cents}, got {tendered_cents})")]
    PaymentMismatch {
        expected_cents: i64,
        tendered_cents: i64,
    },

    /// Waiting for an item's lock exceeded the configured bound.
    ///
    /// Surfaced instead of blocking indefinitely, so a cashier never sees
    /// an unbounded hang under contention. Retryable by the caller.
    #[error("Timed out waiting for lock on item: {item_id}")]
    LockTimeout { item_id: String },

    /// Unexpected storage failure during the settlement.
    #[error("Storage error: {0}")]
    Persistence(#[from] DbError),
}

/// Machine-readable classification of a checkout failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Validation,
    NotFound,
    InsufficientStock,
    PaymentMismatch,
    Concurrency,
    Persistence,
}

impl CheckoutError {
    /// Creates a NotFound error.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CheckoutError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Returns the failure class.
    pub fn code(&self) -> ErrorCode {
        match self {
            CheckoutError::Validation(_) => ErrorCode::Validation,
            CheckoutError::NotFound { .. } => ErrorCode::NotFound,
            CheckoutError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CheckoutError::PaymentMismatch { .. } => ErrorCode::PaymentMismatch,
            CheckoutError::LockTimeout { .. } => ErrorCode::Concurrency,
            CheckoutError::Persistence(_) => ErrorCode::Persistence,
        }
    }

    /// Whether the caller may reasonably retry the identical request.
    ///
    /// Client-correctable failures (validation, not found, stock, payment)
    /// are not retryable as-is; contention and storage hiccups are.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::Concurrency | ErrorCode::Persistence
        )
    }

    /// The wire form of this failure.
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
        }
    }
}

/// Maps pure settlement violations onto the checkout taxonomy.
impl From<CoreError> for CheckoutError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientStock {
                name,
                available,
                requested,
            } => CheckoutError::InsufficientStock {
                name,
                available,
                requested,
            },
            CoreError::PaymentMismatch {
                expected_cents,
                tendered_cents,
            } => CheckoutError::PaymentMismatch {
                expected_cents,
                tendered_cents,
            },
            CoreError::Validation(e) => CheckoutError::Validation(e),
        }
    }
}

/// Failure wire format: `{ "error": "<message>" }`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Result type for settlement operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

// =============================================================================
// Unit Tests
// =============================================================================
