//! # Repositories
//!
//! Repository implementations for the settlement engine's tables.
//!
//! ## Pattern
//! Each repository wraps the shared `SqlitePool` for standalone reads and
//! writes, and exposes `*_in_tx` associated functions for the statements
//! that must run inside the coordinator's settlement transaction.

pub mod customer;
pub mod item;
pub mod sale;

pub use customer::CustomerRepository;
pub use item::ItemRepository;
pub use sale::SaleRepository;
