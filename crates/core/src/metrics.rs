//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Call intake (submissions)
//! - Lifecycle actions (solve, cancel, activate, reprioritize)
//! - Queue depth by status

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, IntGaugeVec, Opts};

/// Calls submitted total.
pub static CALLS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("calldesk_calls_submitted_total", "Total calls submitted").unwrap()
});

/// Lifecycle actions total by action and result.
pub static CALL_ACTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("calldesk_call_actions_total", "Total call actions applied"),
        &["action", "result"], // action: "solve", "cancel", "activate", "reprioritize"; result: "ok", "rejected", "error"
    )
    .unwrap()
});

/// Current number of calls by status.
pub static CALLS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("calldesk_calls_by_status", "Current calls by status"),
        &["status"], // "pending", "active", "solved", "canceled"
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CALLS_SUBMITTED.clone()),
        Box::new(CALL_ACTIONS.clone()),
        Box::new(CALLS_BY_STATUS.clone()),
    ]
}
