//! Emit side and write side of the audit trail.
//!
//! Handlers hold a cheap [`AuditHandle`] clone and fire events into a
//! bounded channel; a single [`AuditWriter`] task drains the channel into
//! the store. A full or closed channel drops the event with an error log,
//! it never fails the call operation that produced it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::{AuditEvent, AuditRecord, AuditStore};

/// An event stamped at emission time, before it reaches the writer.
#[derive(Debug, Clone)]
pub struct AuditEventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: AuditEvent,
}

impl AuditEventEnvelope {
    fn now(event: AuditEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Emitter half of the audit system.
///
/// Built by [`create_audit_system`]; clone freely across tasks.
#[derive(Clone)]
pub struct AuditHandle {
    tx: mpsc::Sender<AuditEventEnvelope>,
}

impl AuditHandle {
    /// Emit an event, waiting for channel capacity.
    ///
    /// Used on the startup/shutdown path where ordering relative to the
    /// writer draining matters more than latency.
    pub async fn emit(&self, event: AuditEvent) {
        if let Err(e) = self.tx.send(AuditEventEnvelope::now(event)).await {
            tracing::error!("Failed to emit audit event: {}", e);
        }
    }

    /// Emit an event without waiting. Returns false if the event was
    /// dropped because the channel is full or closed.
    ///
    /// Call handlers use this: a lagging audit writer must not stall
    /// submits and actions.
    pub fn try_emit(&self, event: AuditEvent) -> bool {
        match self.tx.try_send(AuditEventEnvelope::now(event)) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Dropped audit event: {}", e);
                false
            }
        }
    }
}

/// Background task that drains emitted events into the store.
pub struct AuditWriter {
    rx: mpsc::Receiver<AuditEventEnvelope>,
    store: Arc<dyn AuditStore>,
}

impl AuditWriter {
    /// Run until every handle is dropped and the channel is drained.
    ///
    /// Spawn with `tokio::spawn(writer.run())` and await the join handle
    /// during shutdown so trailing events reach the store.
    pub async fn run(mut self) {
        tracing::info!("Audit writer started");

        while let Some(envelope) = self.rx.recv().await {
            let record = AuditRecord {
                id: 0, // assigned by the store
                timestamp: envelope.timestamp,
                event_type: envelope.event.event_type().to_string(),
                call_id: envelope.event.call_id().map(String::from),
                user_id: envelope.event.user_id().map(String::from),
                data: envelope.event,
            };

            if let Err(e) = self.store.insert(&record) {
                tracing::error!("Failed to write audit event: {}", e);
            }
        }

        tracing::info!("Audit writer shutting down");
    }
}

/// Wire up the audit channel: a cloneable emit handle and the writer task
/// that persists into `store`. Events beyond `buffer_size` block `emit`
/// and fail `try_emit`.
pub fn create_audit_system(
    store: Arc<dyn AuditStore>,
    buffer_size: usize,
) -> (AuditHandle, AuditWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (AuditHandle { tx }, AuditWriter { rx, store })
}
