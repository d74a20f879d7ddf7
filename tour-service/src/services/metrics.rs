//! Prometheus export and the domain counters.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

use crate::dtos::packages::ApprovalDecision;
use crate::models::BookingAction;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global recorder. Call once at startup.
pub fn init_metrics() -> Result<(), anyhow::Error> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {}", e))?;

    METRICS_HANDLE
        .set(handle)
        .map_err(|_| anyhow::anyhow!("metrics handle already initialized"))
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

pub fn record_booking_created() {
    metrics::counter!("bookings_created_total").increment(1);
}

pub fn record_booking_transition(action: BookingAction) {
    metrics::counter!("booking_transitions_total", "action" => action.as_str()).increment(1);
}

pub fn record_package_approval(decision: ApprovalDecision) {
    metrics::counter!("package_approvals_total", "decision" => decision.as_str()).increment(1);
}
