//! HTTP route handlers.

pub mod admin;
pub mod logs;
pub mod slots;
pub mod vehicles;

use std::sync::Arc;

use axum::Router;
use serde::Serialize;
use utoipa::ToSchema;

use crate::server::AppState;

/// Plain acknowledgement body.
#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parking routes (vehicles, slots, logs, reset).
pub fn parking_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(vehicles::routes())
        .merge(slots::routes())
        .merge(logs::routes())
        .merge(admin::routes())
}
