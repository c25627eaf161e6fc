//! # mesa-engine: Storage and Settlement for Mesa POS
//!
//! The stateful half of the Mesa POS settlement engine: the SQLite
//! storage layer and the transaction coordinator that settles checkouts
//! atomically on top of it.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        mesa-engine                                      │
//! │                                                                         │
//! │   ┌──────────────────────────────────────────────────────────────┐     │
//! │   │  checkout::CheckoutEngine — the one entry point              │     │
//! │   │                                                              │     │
//! │   │  validate (mesa-core) → lock (ledger) → BEGIN → reserve →   │     │
//! │   │  calculate (mesa-core) → persist → COMMIT → audit            │     │
//! │   └──────┬──────────────────┬──────────────────────┬─────────────┘     │
//! │          │                  │                      │                    │
//! │   ┌──────▼──────┐    ┌──────▼──────┐       ┌──────▼──────┐            │
//! │   │   ledger    │    │ repository  │       │    audit    │            │
//! │   │ per-item    │    │ items       │       │ post-commit │            │
//! │   │ locks +     │    │ customers   │       │ emission    │            │
//! │   │ reservation │    │ sales       │       │             │            │
//! │   └─────────────┘    └──────┬──────┘       └─────────────┘            │
//! │                             │                                          │
//! │                      ┌──────▼──────┐                                   │
//! │                      │ pool (sqlx) │  WAL SQLite + embedded migrations │
//! │                      └─────────────┘                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - **Atomicity**: a settlement commits completely or leaves no trace
//! - **Stock safety**: per-item locks make check-then-decrement race-free;
//!   stock never goes negative
//! - **Deadlock freedom**: locks are always taken in ascending item-ID
//!   order, with a bounded wait surfaced as a retryable error
//! - **Audit after commit**: audit records are emitted only for sales that
//!   are already durable

pub mod audit;
pub mod checkout;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use audit::{AuditEmitter, AuditEvent, MemoryAuditEmitter, NullAuditEmitter, TracingAuditEmitter};
pub use checkout::{CheckoutEngine, CheckoutReceipt};
pub use error::{CheckoutError, CheckoutResult, DbError, DbResult, ErrorCode, ErrorResponse};
pub use ledger::{LockSet, StockLedger, DEFAULT_LOCK_WAIT};
pub use pool::{Database, DbConfig};
