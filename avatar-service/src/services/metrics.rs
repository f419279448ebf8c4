//! Prometheus metrics for avatar-service.
//!
//! Everything is recorded through the `metrics` facade; the binary installs a
//! Prometheus recorder and `/metrics` renders it. Without a recorder (tests)
//! the macros are no-ops.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder. Must be called once at startup.
pub fn init_metrics() -> Result<(), anyhow::Error> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {}", e))?;

    METRICS_HANDLE
        .set(handle)
        .map_err(|_| anyhow::anyhow!("metrics recorder already initialized"))
}

pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Count one call to an upstream API.
pub fn record_upstream_call(upstream: &'static str, operation: &'static str, success: bool) {
    let outcome = if success { "success" } else { "error" };
    counter!(
        "upstream_requests_total",
        "upstream" => upstream,
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

/// Observe how long a repository query took.
pub fn record_db_query(query: &'static str, elapsed: Duration) {
    histogram!("db_query_duration_seconds", "query" => query).record(elapsed.as_secs_f64());
}
