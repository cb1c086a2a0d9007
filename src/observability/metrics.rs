//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define engine metrics (probes, alerts, incidents, cycles)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `monitor_probes_total` (counter): probes by endpoint, outcome
//! - `monitor_probe_duration_seconds` (histogram): probe latency
//! - `monitor_alerts_created_total` (counter): new alerts by type
//! - `monitor_incidents_created_total` (counter): new incidents by severity
//! - `monitor_cycle_duration_seconds` (histogram): cycle wall time by kind
//! - `monitor_active_endpoints` (gauge): registry size
//! - `monitor_metrics_purged_total` (counter): rows removed by retention
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Endpoint labels use the path, not the id, for readable dashboards

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::model::{AlertType, Severity};

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe(path: &str, outcome: &'static str, elapsed: Duration) {
    metrics::counter!("monitor_probes_total", "endpoint" => path.to_string(), "outcome" => outcome)
        .increment(1);
    metrics::histogram!("monitor_probe_duration_seconds", "endpoint" => path.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_alert_created(alert_type: AlertType) {
    metrics::counter!("monitor_alerts_created_total", "type" => alert_type.as_str()).increment(1);
}

pub fn record_incident_created(severity: Severity) {
    metrics::counter!("monitor_incidents_created_total", "severity" => severity.as_str())
        .increment(1);
}

pub fn record_cycle(kind: &'static str, elapsed: Duration) {
    metrics::histogram!("monitor_cycle_duration_seconds", "cycle" => kind)
        .record(elapsed.as_secs_f64());
}

pub fn set_active_endpoints(count: usize) {
    metrics::gauge!("monitor_active_endpoints").set(count as f64);
}

pub fn record_metrics_purged(count: u64) {
    metrics::counter!("monitor_metrics_purged_total").increment(count);
}
