//! Prometheus Metrics Definitions
//!
//! Defines the Marina metrics and the /metrics endpoint for Prometheus
//! scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec, Encoder,
    HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<MarinaMetrics>> = Lazy::new(MarinaMetrics::new);

/// The registered metrics, or `None` if registration failed.
pub fn metrics() -> Option<&'static MarinaMetrics> {
    METRICS.as_ref().ok()
}

/// Container for all Marina metrics.
#[derive(Clone)]
pub struct MarinaMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Relationship transitions - labels: transition (assign/unassign/release), outcome
    pub relationship_transitions_total: CounterVec,

    /// Load back-references that could not be cleared while deleting a boat
    pub cleanup_failures_total: Counter,
}

impl MarinaMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "marina_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register http_requests_total: {}", e)))?,

            http_request_duration_seconds: register_histogram_vec!(
                "marina_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register http_request_duration_seconds: {}", e)))?,

            relationship_transitions_total: register_counter_vec!(
                "marina_relationship_transitions_total",
                "Boat/load relationship transitions",
                &["transition", "outcome"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register relationship_transitions_total: {}", e)))?,

            cleanup_failures_total: register_counter!(
                "marina_cleanup_failures_total",
                "Load back-references left behind by boat deletion"
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register cleanup_failures_total: {}", e)))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record a relationship transition attempt.
    pub fn record_transition(&self, transition: &str, outcome: &str) {
        self.relationship_transitions_total
            .with_label_values(&[transition, outcome])
            .inc();
    }

    pub fn record_cleanup_failure(&self) {
        self.cleanup_failures_total.inc();
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
)]
pub async fn metrics_handler() -> impl IntoResponse {
    // Registers the Marina families on first scrape.
    let _ = metrics();

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
