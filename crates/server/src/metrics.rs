//! Prometheus metrics for observability.
//!
//! Registers the core metrics into a server-owned registry and exposes
//! them in the Prometheus text format. Queue-depth gauges are refreshed
//! from the store on each scrape.

use once_cell::sync::Lazy;
use prometheus::{self, Encoder, Registry, TextEncoder};

use calldesk_core::call::CallStatus;
use calldesk_core::metrics::{all_metrics, CALLS_BY_STATUS};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for metric in all_metrics() {
        registry.register(metric).unwrap();
    }
    registry
});

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Refresh queue-depth gauges from the current worklist.
///
/// Called before encoding so each scrape sees current counts.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    if let Ok(worklist) = state.engine().worklist() {
        for status in [
            CallStatus::Pending,
            CallStatus::Active,
            CallStatus::Solved,
            CallStatus::Canceled,
        ] {
            let count = worklist.iter().filter(|c| c.status == status).count();
            CALLS_BY_STATUS
                .with_label_values(&[status.as_str()])
                .set(count as i64);
        }
    }
}
