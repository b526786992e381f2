//! HTTP server setup and configuration.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::extract::OriginalUri;
use axum::http::Method;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router, middleware};
use serde::Serialize;
use tower::ServiceBuilder;
use tower::limit::ConcurrencyLimitLayer;
use tower::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::ToSchema;

use parking_core::clock::{Clock, SystemClock};
use parking_core::coordinator::ParkingCoordinator;
use parking_core::observer::ParkingObserver;

use crate::config::Config;
use crate::error::ApiError;
use crate::metrics::PrometheusObserver;

/// Server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listener could not bind its address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The server loop exited with an error.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    /// The coordinator could not publish its initial state.
    #[error("startup failed: {0}")]
    Startup(#[from] parking_core::error::ParkingError),
}

// ============================================================================
// Health Response
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    coordinator: Arc<ParkingCoordinator>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

impl AppState {
    /// Creates application state around an existing coordinator.
    #[must_use]
    pub fn new(config: Config, coordinator: Arc<ParkingCoordinator>) -> Self {
        Self {
            config,
            coordinator,
        }
    }

    /// Returns the parking coordinator.
    #[must_use]
    pub fn coordinator(&self) -> &ParkingCoordinator {
        &self.coordinator
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    tag = "admin",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse),
    )
)]
pub(crate) async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn openapi_json() -> impl IntoResponse {
    Json(crate::openapi::openapi())
}

async fn not_found(method: Method, uri: OriginalUri) -> ApiError {
    ApiError::not_found(format!("not found: {method} {}", uri.0.path()))
}

async fn handle_middleware_error(err: tower::BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError::request_timeout("Request timed out")
    } else {
        tracing::error!(error = %err, "Unhandled middleware error");
        ApiError::internal("Internal server error")
    }
}

// ============================================================================
// Server
// ============================================================================

/// The parking API server.
pub struct Server {
    config: Config,
    coordinator: Arc<ParkingCoordinator>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

impl Server {
    /// Creates a server with the system clock and Prometheus observer.
    #[must_use]
    pub fn new(config: Config) -> Self {
        ServerBuilder::new().config(config).build()
    }

    /// Creates a new `ServerBuilder`.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the coordinator shared with request handlers.
    #[must_use]
    pub fn coordinator(&self) -> Arc<ParkingCoordinator> {
        Arc::clone(&self.coordinator)
    }

    /// Creates the router with all routes and middleware.
    fn create_router(&self) -> Router {
        let state = Arc::new(AppState::new(
            self.config.clone(),
            Arc::clone(&self.coordinator),
        ));

        let router = Router::new()
            .route("/health", get(health))
            .route("/metrics", get(crate::metrics::serve_metrics))
            .route("/openapi.json", get(openapi_json))
            .merge(crate::routes::parking_routes())
            .fallback(not_found);

        with_middleware(
            router,
            self.config.request_timeout(),
            self.config.concurrency_limit,
        )
        .with_state(state)
    }

    /// Starts the server and blocks until shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot bind to its address or the
    /// server loop fails.
    pub async fn serve(&self) -> Result<(), ServerError> {
        crate::metrics::init_metrics();
        self.coordinator.publish_occupancy()?;

        let addr = self.config.bind_addr();
        let router = self.create_router();

        tracing::info!(
            addr = %addr,
            slot_count = self.coordinator.slot_count(),
            "Starting parking API server"
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(ServerError::Serve)?;

        tracing::info!("Parking API server stopped");
        Ok(())
    }

    /// Creates a test router for the server.
    ///
    /// Routes share this server's coordinator, so tests can inspect state
    /// through [`Server::coordinator`] without binding a port.
    #[doc(hidden)]
    pub fn test_router(&self) -> Router {
        self.create_router()
    }
}

/// Wraps `router` in trace, concurrency-limit, timeout and metrics layers.
///
/// Metrics is outermost so timed-out and rejected requests are still counted.
fn with_middleware<S>(
    router: Router<S>,
    request_timeout: Option<Duration>,
    concurrency_limit: Option<usize>,
) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let router = router.layer(TraceLayer::new_for_http());

    let router = match concurrency_limit {
        Some(limit) => router.layer(ConcurrencyLimitLayer::new(limit)),
        None => router,
    };

    let router = match request_timeout {
        Some(timeout) => router.layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .layer(TimeoutLayer::new(timeout)),
        ),
        None => router,
    };

    router.layer(middleware::from_fn(crate::metrics::metrics_middleware))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Builder for constructing a server.
pub struct ServerBuilder {
    config: Config,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn ParkingObserver>,
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("observer", &"<ParkingObserver>")
            .finish()
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self {
            config: Config::default(),
            clock: Arc::new(SystemClock),
            observer: Arc::new(PrometheusObserver),
        }
    }
}

impl ServerBuilder {
    /// Creates a new server builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Sets the HTTP port.
    #[must_use]
    pub fn http_port(mut self, port: u16) -> Self {
        self.config.http_port = port;
        self
    }

    /// Sets the number of parking slots.
    #[must_use]
    pub fn slot_count(mut self, count: u32) -> Self {
        self.config.slot_count = count;
        self
    }

    /// Enables debug mode.
    #[must_use]
    pub fn debug(mut self, enabled: bool) -> Self {
        self.config.debug = enabled;
        self
    }

    /// Sets the per-request timeout in seconds.
    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    /// Sets the time source used for entry and exit timestamps.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the observer notified of parking transitions.
    ///
    /// Defaults to [`PrometheusObserver`].
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn ParkingObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        let coordinator = ParkingCoordinator::new(self.config.slot_count)
            .with_clock(self.clock)
            .with_observer(self.observer);
        Server {
            config: self.config,
            coordinator: Arc::new(coordinator),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use parking_core::observability::LogFormat;

    use crate::error::ApiErrorBody;

    #[tokio::test]
    async fn test_health_endpoint() -> Result<()> {
        let server = ServerBuilder::new().build();
        let router = server.test_router();

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .context("build request")?;

        let response = router.oneshot(request).await.map_err(|err| match err {})?;

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .context("read response body")?;
        let health: HealthResponse = serde_json::from_slice(&body).context("parse JSON body")?;
        assert_eq!(health.status, "ok");
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_route_returns_json_404() -> Result<()> {
        let router = ServerBuilder::new().build().test_router();

        let request = Request::builder()
            .uri("/parking/lots")
            .body(Body::empty())
            .context("build request")?;
        let response = router.oneshot(request).await.map_err(|err| match err {})?;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .context("read response body")?;
        let error: ApiErrorBody = serde_json::from_slice(&body).context("parse JSON body")?;
        assert_eq!(error.code, "NOT_FOUND");
        Ok(())
    }

    #[tokio::test]
    async fn test_openapi_endpoint_lists_parking_paths() -> Result<()> {
        let router = ServerBuilder::new().build().test_router();

        let request = Request::builder()
            .uri("/openapi.json")
            .body(Body::empty())
            .context("build request")?;
        let response = router.oneshot(request).await.map_err(|err| match err {})?;

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .context("read response body")?;
        let doc: serde_json::Value = serde_json::from_slice(&body).context("parse JSON body")?;
        assert!(doc["paths"]["/assign/{vehicle_id}"].is_object());
        Ok(())
    }

    #[test]
    fn test_builder_sizes_coordinator_from_config() {
        let server = ServerBuilder::new()
            .http_port(9100)
            .slot_count(5)
            .debug(true)
            .request_timeout_secs(2)
            .build();
        assert_eq!(server.coordinator().slot_count(), 5);
        assert_eq!(server.config().http_port, 9100);
        assert_eq!(server.config().bind_addr().port(), 9100);
        assert_eq!(server.config().log_format(), LogFormat::Pretty);
        assert_eq!(server.config().request_timeout(), Some(Duration::from_secs(2)));
        let _router = server.test_router();
    }

    #[tokio::test]
    async fn test_timed_out_request_is_counted() -> Result<()> {
        let handle = crate::metrics::init_metrics();
        let router = with_middleware(
            Router::new().route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    "done"
                }),
            ),
            Some(Duration::from_millis(20)),
            Some(4),
        );

        let request = Request::builder()
            .uri("/slow")
            .body(Body::empty())
            .context("build request")?;
        let response = router.oneshot(request).await.map_err(|err| match err {})?;

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .context("read response body")?;
        let error: ApiErrorBody = serde_json::from_slice(&body).context("parse JSON body")?;
        assert_eq!(error.code, "REQUEST_TIMEOUT");

        let metrics = handle.render();
        assert!(
            metrics
                .lines()
                .filter(|line| line.starts_with(crate::metrics::HTTP_REQUESTS_TOTAL))
                .any(|line| line.contains("endpoint=\"/slow\""))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_timeout_error_maps_to_408() {
        let err: tower::BoxError = Box::new(tower::timeout::error::Elapsed::new());
        let response = handle_middleware_error(err).await.into_response();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
