//! Prometheus metrics for backoffice-service.
//!
//! Business counters live in the default `prometheus` registry; HTTP request
//! metrics recorded by the shared middleware go through the `metrics` facade
//! and are rendered by the exporter handle. `/metrics` serves both.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

/// Handle to the `metrics` recorder, `None` when another recorder was
/// already installed in this process.
static METRICS_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "backoffice_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Posted invoice payments by method.
pub static PAYMENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "backoffice_payments_total",
        "Total number of invoice payments by method",
        &["method"]
    )
    .expect("Failed to register payments_total")
});

/// Amount collected, in rupiah, by method.
pub static PAYMENT_AMOUNT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "backoffice_payment_amount_total",
        "Total amount collected in rupiah by method",
        &["method"]
    )
    .expect("Failed to register payment_amount_total")
});

/// Registration attempts by outcome.
pub static REGISTRATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "backoffice_registrations_total",
        "Total number of customer registrations by outcome",
        &["outcome"] // created, conflict, provisioning_failed, failed
    )
    .expect("Failed to register registrations_total")
});

/// Router calls that failed, by operation.
pub static PROVISIONING_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "backoffice_provisioning_failures_total",
        "Total number of failed router provisioning calls",
        &["operation"] // create, remove
    )
    .expect("Failed to register provisioning_failures_total")
});

/// Initialize all metrics. Safe to call more than once.
pub fn init_metrics() {
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&PAYMENTS_TOTAL);
    Lazy::force(&PAYMENT_AMOUNT_TOTAL);
    Lazy::force(&REGISTRATIONS_TOTAL);
    Lazy::force(&PROVISIONING_FAILURES_TOTAL);

    METRICS_HANDLE.get_or_init(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Prometheus recorder not installed");
            None
        }
    });
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut output = encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default();

    if let Some(handle) = METRICS_HANDLE.get().and_then(Option::as_ref) {
        output.push_str(&handle.render());
    }

    output
}
