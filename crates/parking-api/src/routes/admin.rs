//! Administrative routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use crate::error::ApiResult;
use crate::routes::MessageResponse;
use crate::server::AppState;

/// Creates admin routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/reset", post(reset_system))
}

/// Clear every vehicle, slot assignment and log entry.
///
/// Vehicle ids restart at 1.
#[utoipa::path(
    post,
    path = "/reset",
    tag = "admin",
    responses(
        (status = 200, description = "System reset", body = MessageResponse),
        (status = 500, description = "Internal error", body = ApiErrorBody),
    )
)]
pub(crate) async fn reset_system(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<MessageResponse>> {
    state.coordinator().reset()?;
    Ok(Json(MessageResponse::new("System reset successful")))
}
