//! # Audit Emission
//!
//! Post-commit audit records for settlements.
//!
//! Emission happens strictly after the settlement transaction commits and
//! is fire-and-forget: an emitter must never fail the sale that already
//! happened, so the trait is infallible and implementations swallow their
//! own problems.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;
use tracing::info;

/// One audit record describing a committed action.
///
/// Serializes with snake_case keys, matching the checkout wire format.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// User ID of the cashier who performed the action.
    pub actor: String,

    /// Action verb ("create" for settlements).
    pub action: String,

    /// Entity type ("Sale").
    pub entity: String,

    /// ID of the affected entity.
    pub entity_id: String,

    /// Branch the action happened in.
    pub branch_id: String,

    /// Human-readable one-liner for the audit trail.
    pub summary: String,

    /// When the event was emitted.
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    /// Builds the record for a committed sale.
    pub fn sale_created(
        actor: impl Into<String>,
        sale_id: impl Into<String>,
        branch_id: impl Into<String>,
        final_total_cents: i64,
    ) -> Self {
        let sale_id = sale_id.into();
        AuditEvent {
            actor: actor.into(),
            action: "create".to_string(),
            entity: "Sale".to_string(),
            summary: format!("Sale {sale_id} settled for {final_total_cents} cents"),
            entity_id: sale_id,
            branch_id: branch_id.into(),
            at: Utc::now(),
        }
    }
}

/// Sink for audit records.
///
/// Called only after the data the record describes is durable.
pub trait AuditEmitter: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

/// Emits audit records as structured log events under the `audit` target.
#[derive(Debug, Default)]
pub struct TracingAuditEmitter;

impl AuditEmitter for TracingAuditEmitter {
    fn emit(&self, event: AuditEvent) {
        info!(
            target: "audit",
            actor = %event.actor,
            action = %event.action,
            entity = %event.entity,
            entity_id = %event.entity_id,
            branch_id = %event.branch_id,
            "{}",
            event.summary
        );
    }
}

/// Collects audit records in memory. For tests.
#[derive(Debug, Default)]
pub struct MemoryAuditEmitter {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditEmitter {
    pub fn new() -> Self {
        MemoryAuditEmitter::default()
    }

    /// Returns a snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AuditEmitter for MemoryAuditEmitter {
    fn emit(&self, event: AuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Discards all audit records.
#[derive(Debug, Default)]
pub struct NullAuditEmitter;

impl AuditEmitter for NullAuditEmitter {
    fn emit(&self, _event: AuditEvent) {}
}

// =============================================================================
// Unit Tests
// =============================================================================
