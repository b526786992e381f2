//! # parking-api
//!
//! HTTP facade for the parking coordinator.
//!
//! ## Endpoints
//!
//! - `POST /vehicles`, `GET|PUT|DELETE /vehicles/{vehicle_id}`
//! - `GET /slots`, `POST /assign/{vehicle_id}`, `POST /release/{slot_id}`
//! - `GET /logs`, `POST /reset`
//! - `GET /health`, `GET /metrics`, `GET /openapi.json`
//!
//! ## Example
//!
//! ```rust,no_run
//! use parking_api::config::Config;
//! use parking_api::server::Server;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let server = Server::new(Config::from_env()?);
//! server.serve().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod error;
pub mod metrics;
pub mod openapi;
pub mod routes;
pub mod server;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{ApiError, ApiErrorBody, ApiResult};
    pub use crate::metrics::PrometheusObserver;
    pub use crate::server::{AppState, Server, ServerBuilder, ServerError};
}
