//! Metrics collection and exposition.
//!
//! # Metrics
//! - `nodehost_lifecycle_state` (gauge): coordinator state ordinal
//! - `nodehost_shutdown_failures_total` (counter): by subsystem
//! - `nodehost_http_requests_total` (counter): by method, status

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::lifecycle::{LifecycleState, Subsystem};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_lifecycle_state(state: LifecycleState) {
    gauge!("nodehost_lifecycle_state").set(state as u8 as f64);
}

pub fn record_shutdown_failure(subsystem: Subsystem) {
    counter!("nodehost_shutdown_failures_total", "subsystem" => subsystem.as_str()).increment(1);
}

pub fn record_request(method: &str, status: u16) {
    counter!(
        "nodehost_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
