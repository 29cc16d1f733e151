//! Prometheus metrics endpoint and HTTP request tracking middleware.
//!
//! This module provides:
//! - A `/metrics` endpoint that returns Prometheus-formatted metrics
//! - Middleware for tracking HTTP request counts and durations
//! - Helper functions to record slot allocations

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Instant;

use crate::allocation::SlotBand;
use crate::db::ParkingSession;
use crate::AppState;

// Metric names as constants for consistency
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const SLOT_ALLOCATIONS_TOTAL: &str = "slot_allocations_total";
pub const ALLOCATION_FAILURES_TOTAL: &str = "slot_allocation_failures_total";
pub const OCCUPIED_LOTS: &str = "occupied_lots";

/// Install the Prometheus recorder and return a handle for rendering metrics.
///
/// Call once during startup; a second install fails.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!(
        HTTP_REQUESTS_TOTAL,
        "Total number of HTTP requests received"
    );
    describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "HTTP request duration in seconds"
    );
    describe_counter!(
        SLOT_ALLOCATIONS_TOTAL,
        "Parking lots assigned, by band"
    );
    describe_counter!(
        ALLOCATION_FAILURES_TOTAL,
        "Start parking requests that got no lot, by reason"
    );
    describe_gauge!(OCCUPIED_LOTS, "Parking lots held by an active session");

    Ok(handle)
}

/// GET /metrics - Returns Prometheus-formatted metrics.
///
/// This endpoint is accessible without authentication.
pub async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    update_gauge_metrics(&state).await;

    match state.metrics_handle.as_ref() {
        Some(h) => (StatusCode::OK, h.render()),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Metrics not initialized".to_string(),
        ),
    }
}

async fn update_gauge_metrics(state: &AppState) {
    if let Ok(count) = ParkingSession::count(&state.db).await {
        gauge!(OCCUPIED_LOTS).set(count as f64);
    }
}

/// Middleware to track HTTP request metrics.
///
/// Records:
/// - `http_requests_total` counter with method, path, and status labels
/// - `http_request_duration_seconds` histogram with method and path labels
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();

    // Matched path keeps label cardinality bounded
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let method = request.method().to_string();

    let response = next.run(request).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(HTTP_REQUESTS_TOTAL, "method" => method.clone(), "path" => path.clone(), "status" => status).increment(1);
    histogram!(HTTP_REQUEST_DURATION_SECONDS, "method" => method, "path" => path).record(duration);

    response
}

/// Record a lot handed out from `band`.
pub fn record_allocation(band: SlotBand) {
    counter!(SLOT_ALLOCATIONS_TOTAL, "band" => band.as_str()).increment(1);
}

/// Record a start parking request that ended without a lot.
pub fn record_allocation_failure(reason: &'static str) {
    counter!(ALLOCATION_FAILURES_TOTAL, "reason" => reason).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        // Prometheus naming conventions
        assert!(HTTP_REQUESTS_TOTAL.ends_with("_total"));
        assert!(SLOT_ALLOCATIONS_TOTAL.ends_with("_total"));
        assert!(ALLOCATION_FAILURES_TOTAL.ends_with("_total"));
        assert!(HTTP_REQUEST_DURATION_SECONDS.ends_with("_seconds"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_allocation(SlotBand::Motorcycle);
        record_allocation_failure("capacity_exhausted");
    }
}
