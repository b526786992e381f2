//! Prometheus metrics for the parking API.
//!
//! Two sources feed the recorder:
//! - the HTTP middleware (request count and latency per endpoint)
//! - [`PrometheusObserver`], attached to the coordinator, which records
//!   entries, exits, parking durations and slot gauges

use std::sync::OnceLock;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use parking_core::error::ParkingError;
use parking_core::id::{SlotId, VehicleId};
use parking_core::observer::{Occupancy, ParkingObserver};
use parking_core::session_log::SessionLogEntry;

// ============================================================================
// Metric Names
// ============================================================================

/// Vehicle entry counter.
pub const VEHICLE_ENTRIES: &str = "vehicle_entries_total";

/// Vehicle exit counter.
pub const VEHICLE_EXITS: &str = "vehicle_exits_total";

/// Occupied slots gauge.
pub const OCCUPIED_SLOTS: &str = "occupied_slots";

/// Free slots gauge.
pub const FREE_SLOTS: &str = "free_slots";

/// Parking duration histogram.
pub const PARKING_DURATION: &str = "parking_duration_seconds";

/// Broken-invariant counter.
pub const INTERNAL_ERRORS: &str = "parking_internal_errors_total";

/// HTTP request counter.
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";

/// HTTP request duration histogram.
pub const HTTP_REQUEST_DURATION: &str = "http_request_duration_seconds";

const UNMATCHED_ENDPOINT: &str = "unknown";

const HISTOGRAM_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

// ============================================================================
// Prometheus Recorder
// ============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initializes the global metrics recorder with Prometheus exporter.
///
/// Safe to call multiple times; subsequent calls are no-ops.
///
/// # Panics
///
/// Panics if the Prometheus recorder cannot be installed. The server should
/// not start without its metrics endpoint.
#[allow(clippy::panic)]
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .set_buckets(HISTOGRAM_BUCKETS)
                .and_then(PrometheusBuilder::install_recorder)
                .unwrap_or_else(|e| panic!("failed to install prometheus recorder: {e}"));

            describe_counter!(VEHICLE_ENTRIES, "Total number of vehicle entries");
            describe_counter!(VEHICLE_EXITS, "Total number of vehicle exits");
            describe_gauge!(OCCUPIED_SLOTS, "Number of occupied parking slots");
            describe_gauge!(FREE_SLOTS, "Number of free parking slots");
            describe_histogram!(PARKING_DURATION, "Time spent parked");
            describe_counter!(
                INTERNAL_ERRORS,
                "Operations rejected because parking state was inconsistent"
            );
            describe_counter!(HTTP_REQUESTS_TOTAL, "Count of HTTP requests");
            describe_histogram!(HTTP_REQUEST_DURATION, "Request latency");

            tracing::info!("Prometheus metrics recorder initialized");
            handle
        })
        .clone()
}

/// Returns the global Prometheus handle, if initialized.
#[must_use]
pub fn prometheus_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// ============================================================================
// Coordinator Observer
// ============================================================================

/// Records coordinator transitions into the global metrics recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusObserver;

impl ParkingObserver for PrometheusObserver {
    fn vehicle_entered(&self, _vehicle_id: VehicleId, _slot_id: SlotId) {
        counter!(VEHICLE_ENTRIES).increment(1);
    }

    fn vehicle_exited(&self, session: &SessionLogEntry) {
        counter!(VEHICLE_EXITS).increment(1);
        histogram!(PARKING_DURATION).record(session.duration_seconds);
    }

    #[allow(clippy::cast_precision_loss)]
    fn occupancy_changed(&self, occupancy: Occupancy) {
        gauge!(OCCUPIED_SLOTS).set(occupancy.occupied as f64);
        gauge!(FREE_SLOTS).set(occupancy.free as f64);
    }

    fn internal_error(&self, operation: &'static str, _error: &ParkingError) {
        counter!(INTERNAL_ERRORS, "operation" => operation).increment(1);
    }
}

// ============================================================================
// Metrics Middleware
// ============================================================================

pub(crate) fn endpoint_label<B>(request: &Request<B>) -> String {
    request.extensions().get::<MatchedPath>().map_or_else(
        || UNMATCHED_ENDPOINT.to_string(),
        |path| path.as_str().to_string(),
    )
}

/// Middleware that records request metrics.
///
/// Captures:
/// - `http_requests_total{method, endpoint}`
/// - `http_request_duration_seconds{method, endpoint}`
///
/// Endpoints are labelled by route template (`/vehicles/:vehicle_id`), never
/// by the concrete path.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let endpoint = endpoint_label(&request);
    let method = request.method().to_string();

    let response = next.run(request).await;

    let duration = start.elapsed().as_secs_f64();
    let labels = [("method", method.clone()), ("endpoint", endpoint.clone())];

    counter!(HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(HTTP_REQUEST_DURATION, &labels).record(duration);

    if duration > 1.0 {
        tracing::warn!(
            endpoint = %endpoint,
            method = %method,
            status = response.status().as_u16(),
            duration_secs = %duration,
            "Slow request detected"
        );
    }

    response
}

// ============================================================================
// Metrics Endpoint
// ============================================================================

/// Handler for the `/metrics` endpoint.
///
/// Returns Prometheus-formatted metrics text.
pub async fn serve_metrics() -> impl IntoResponse {
    prometheus_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain; charset=utf-8")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                handle.render(),
            )
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Body;
    use axum::routing::get;
    use chrono::{DateTime, Utc};
    use tower::ServiceExt;

    fn metric_lines<'a>(metrics: &'a str, name: &str) -> Vec<&'a str> {
        metrics
            .lines()
            .filter(|line| line.starts_with(name))
            .collect()
    }

    #[test]
    fn test_endpoint_label_unmatched() {
        let request = Request::builder()
            .uri("/missing")
            .body(Body::empty())
            .unwrap();
        assert_eq!(endpoint_label(&request), UNMATCHED_ENDPOINT);
    }

    #[test]
    fn test_observer_records_parking_metrics() {
        let handle = init_metrics();
        let observer = PrometheusObserver;
        let entry_time: DateTime<Utc> = DateTime::from_timestamp(1_000, 0).unwrap();
        let session = SessionLogEntry::new(
            VehicleId::new(1),
            SlotId::new(1),
            entry_time,
            entry_time + chrono::Duration::seconds(3),
        );

        observer.vehicle_entered(VehicleId::new(1), SlotId::new(1));
        observer.vehicle_exited(&session);
        observer.occupancy_changed(Occupancy {
            occupied: 0,
            free: 3,
        });
        observer.internal_error("release", &ParkingError::inconsistent("test"));

        let metrics = handle.render();
        assert!(!metric_lines(&metrics, VEHICLE_ENTRIES).is_empty());
        assert!(!metric_lines(&metrics, VEHICLE_EXITS).is_empty());
        assert!(!metric_lines(&metrics, "parking_duration_seconds_bucket").is_empty());
        assert!(!metric_lines(&metrics, FREE_SLOTS).is_empty());
        assert!(
            metric_lines(&metrics, INTERNAL_ERRORS)
                .iter()
                .any(|line| line.contains("operation=\"release\""))
        );
    }

    #[tokio::test]
    async fn test_request_metrics_use_route_template() {
        let handle = init_metrics();
        let app = Router::new()
            .route("/widgets/:id", get(|| async { StatusCode::OK }))
            .route_layer(axum::middleware::from_fn(metrics_middleware));
        let request = Request::builder()
            .uri("/widgets/123")
            .body(Body::empty())
            .unwrap();

        let _response = app.oneshot(request).await.unwrap();

        let metrics = handle.render();
        assert!(
            metric_lines(&metrics, HTTP_REQUESTS_TOTAL)
                .iter()
                .any(|line| line.contains("endpoint=\"/widgets/:id\""))
        );
        assert!(!metrics.contains("endpoint=\"/widgets/123\""));
        assert!(!metrics.contains("status_class"));
    }
}
