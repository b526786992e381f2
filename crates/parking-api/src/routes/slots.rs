//! Slot routes.
//!
//! ## Routes
//!
//! - `GET  /slots` - List slots in id order
//! - `POST /assign/{vehicle_id}` - Park a vehicle in the lowest free slot
//! - `POST /release/{slot_id}` - Free a slot and log the session

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use parking_core::id::SlotId;
use parking_core::observability::vehicle_span;
use parking_core::slots::Slot;

use crate::error::{ApiError, ApiResult};
use crate::routes::vehicles::parse_vehicle_id;
use crate::server::AppState;

/// Slot response.
#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct SlotResponse {
    /// Slot id, numbered from 1.
    pub id: u32,
    /// Whether a vehicle holds the slot.
    pub occupied: bool,
    /// Id of the vehicle holding the slot.
    pub vehicle_id: Option<String>,
}

impl From<Slot> for SlotResponse {
    fn from(slot: Slot) -> Self {
        Self {
            id: slot.id.get(),
            occupied: slot.occupied,
            vehicle_id: slot.vehicle_id.map(|id| id.to_string()),
        }
    }
}

/// Response to a successful assignment.
#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct AssignResponse {
    /// Human-readable outcome.
    pub message: String,
    /// Slot the vehicle now occupies.
    pub slot_id: u32,
}

/// Response to a successful release.
#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ReleaseResponse {
    /// Human-readable outcome.
    pub message: String,
    /// Parking duration in seconds.
    pub duration: f64,
}

/// Creates slot routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/slots", get(list_slots))
        .route("/assign/:vehicle_id", post(assign_slot))
        .route("/release/:slot_id", post(release_slot))
}

/// List slots.
#[utoipa::path(
    get,
    path = "/slots",
    tag = "slots",
    responses(
        (status = 200, description = "Slots in id order", body = [SlotResponse]),
    )
)]
pub(crate) async fn list_slots(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<SlotResponse>>> {
    let slots = state.coordinator().slots()?;
    Ok(Json(slots.into_iter().map(SlotResponse::from).collect()))
}

/// Assign the lowest free slot to a vehicle.
#[utoipa::path(
    post,
    path = "/assign/{vehicle_id}",
    tag = "slots",
    params(("vehicle_id" = String, Path, description = "Vehicle id")),
    responses(
        (status = 200, description = "Vehicle assigned", body = AssignResponse),
        (status = 400, description = "Vehicle already parked", body = ApiErrorBody),
        (status = 403, description = "No free slots available", body = ApiErrorBody),
        (status = 404, description = "Vehicle not found", body = ApiErrorBody),
    )
)]
pub(crate) async fn assign_slot(
    State(state): State<Arc<AppState>>,
    Path(vehicle_id): Path<String>,
) -> ApiResult<Json<AssignResponse>> {
    let vehicle_id = parse_vehicle_id(&vehicle_id)?;
    let slot_id =
        vehicle_span("assign", vehicle_id).in_scope(|| state.coordinator().assign(vehicle_id))?;
    Ok(Json(AssignResponse {
        message: format!("Vehicle assigned to slot {slot_id}"),
        slot_id: slot_id.get(),
    }))
}

/// Release a slot.
#[utoipa::path(
    post,
    path = "/release/{slot_id}",
    tag = "slots",
    params(("slot_id" = u32, Path, description = "Slot id")),
    responses(
        (status = 200, description = "Slot released", body = ReleaseResponse),
        (status = 400, description = "Slot already free", body = ApiErrorBody),
        (status = 404, description = "Invalid slot ID", body = ApiErrorBody),
        (status = 500, description = "Slot and vehicle records disagree", body = ApiErrorBody),
    )
)]
pub(crate) async fn release_slot(
    State(state): State<Arc<AppState>>,
    Path(slot_id): Path<String>,
) -> ApiResult<Json<ReleaseResponse>> {
    let slot_id: SlotId = slot_id.parse().map_err(|_| ApiError::invalid_slot())?;

    let duration = state.coordinator().release(slot_id)?;
    Ok(Json(ReleaseResponse {
        message: format!("Slot {slot_id} released"),
        duration,
    }))
}
