//! Metrics collection and exposition.
//!
//! # Metrics
//! - `grouplog_sink_errors_total` (counter): failed deliveries by sink
//! - `grouplog_configure_total` (counter): configure attempts by outcome
//! - `grouplog_loggers` (gauge): registered logger handles
//!
//! # Design Decisions
//! - Sink label only, never logger names (unbounded cardinality)

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus exporter listening"),
        Err(e) => tracing::error!(error = %e, address = %addr, "Failed to install Prometheus exporter"),
    }
}

pub fn record_sink_error(sink: &str) {
    metrics::counter!("grouplog_sink_errors_total", "sink" => sink.to_string()).increment(1);
}

pub fn record_configure(success: bool) {
    let outcome = if success { "ok" } else { "error" };
    metrics::counter!("grouplog_configure_total", "outcome" => outcome).increment(1);
}

pub fn record_logger_count(count: usize) {
    metrics::gauge!("grouplog_loggers").set(count as f64);
}
