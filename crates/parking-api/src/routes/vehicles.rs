//! Vehicle registry routes.
//!
//! ## Routes
//!
//! - `POST   /vehicles` - Register a vehicle
//! - `GET    /vehicles/{vehicle_id}` - Get a vehicle
//! - `PUT    /vehicles/{vehicle_id}` - Update a vehicle's plate
//! - `DELETE /vehicles/{vehicle_id}` - Delete a vehicle, freeing its slot

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use parking_core::id::VehicleId;
use parking_core::observability::vehicle_span;
use parking_core::registry::Vehicle;

use crate::error::{ApiError, ApiResult};
use crate::routes::MessageResponse;
use crate::server::AppState;

/// Request to register a vehicle.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterVehicleRequest {
    /// License plate.
    pub plate: String,
}

/// Response to a registration.
#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize))]
pub struct RegisterVehicleResponse {
    /// Human-readable outcome.
    pub message: String,
    /// Id of the new vehicle.
    pub vehicle_id: String,
}

/// Request to update a vehicle.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateVehicleRequest {
    /// New license plate. Omit to keep the current one.
    #[serde(default)]
    pub plate: Option<String>,
}

/// Vehicle response.
#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize))]
pub struct VehicleResponse {
    /// Vehicle id.
    pub id: String,
    /// License plate.
    pub plate: String,
    /// Entry timestamp (RFC 3339) while parked.
    pub entry_time: Option<String>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id.to_string(),
            plate: vehicle.plate,
            entry_time: vehicle
                .entry_time
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Micros, true)),
        }
    }
}

/// Creates vehicle routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/vehicles", post(register_vehicle))
        .route(
            "/vehicles/:vehicle_id",
            axum::routing::get(get_vehicle)
                .put(update_vehicle)
                .delete(delete_vehicle),
        )
}

/// Parses a vehicle id from a path segment.
///
/// An id that cannot name any vehicle is reported as not found.
pub(crate) fn parse_vehicle_id(raw: &str) -> ApiResult<VehicleId> {
    raw.parse().map_err(|_| ApiError::vehicle_not_found())
}

/// Register a vehicle.
#[utoipa::path(
    post,
    path = "/vehicles",
    tag = "vehicles",
    request_body = RegisterVehicleRequest,
    responses(
        (status = 201, description = "Vehicle registered", body = RegisterVehicleResponse),
        (status = 400, description = "Missing or blank plate", body = ApiErrorBody),
    )
)]
pub(crate) async fn register_vehicle(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegisterVehicleRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = body?;
    let vehicle_id = state.coordinator().register_vehicle(&req.plate)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterVehicleResponse {
            message: "Vehicle registered".to_string(),
            vehicle_id: vehicle_id.to_string(),
        }),
    ))
}

/// Get a vehicle.
#[utoipa::path(
    get,
    path = "/vehicles/{vehicle_id}",
    tag = "vehicles",
    params(("vehicle_id" = String, Path, description = "Vehicle id")),
    responses(
        (status = 200, description = "Vehicle", body = VehicleResponse),
        (status = 404, description = "Vehicle not found", body = ApiErrorBody),
    )
)]
pub(crate) async fn get_vehicle(
    State(state): State<Arc<AppState>>,
    Path(vehicle_id): Path<String>,
) -> ApiResult<Json<VehicleResponse>> {
    let vehicle_id = parse_vehicle_id(&vehicle_id)?;
    let vehicle = state.coordinator().vehicle(vehicle_id)?;
    Ok(Json(vehicle.into()))
}

/// Update a vehicle's plate.
#[utoipa::path(
    put,
    path = "/vehicles/{vehicle_id}",
    tag = "vehicles",
    params(("vehicle_id" = String, Path, description = "Vehicle id")),
    request_body = UpdateVehicleRequest,
    responses(
        (status = 200, description = "Vehicle updated", body = MessageResponse),
        (status = 400, description = "Malformed body or blank plate", body = ApiErrorBody),
        (status = 404, description = "Vehicle not found", body = ApiErrorBody),
    )
)]
pub(crate) async fn update_vehicle(
    State(state): State<Arc<AppState>>,
    Path(vehicle_id): Path<String>,
    body: Result<Json<UpdateVehicleRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let vehicle_id = parse_vehicle_id(&vehicle_id)?;
    let coordinator = state.coordinator();
    // Existence is checked before the body so an unknown id is always a 404.
    coordinator.vehicle(vehicle_id)?;

    let Json(req) = body?;
    if let Some(plate) = req.plate.as_deref() {
        vehicle_span("update", vehicle_id)
            .in_scope(|| coordinator.update_plate(vehicle_id, plate))?;
    }
    Ok(Json(MessageResponse::new("Vehicle updated")))
}

/// Delete a vehicle.
///
/// A parked vehicle's slot is freed without logging a session.
#[utoipa::path(
    delete,
    path = "/vehicles/{vehicle_id}",
    tag = "vehicles",
    params(("vehicle_id" = String, Path, description = "Vehicle id")),
    responses(
        (status = 200, description = "Vehicle deleted", body = MessageResponse),
        (status = 404, description = "Vehicle not found", body = ApiErrorBody),
    )
)]
pub(crate) async fn delete_vehicle(
    State(state): State<Arc<AppState>>,
    Path(vehicle_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let vehicle_id = parse_vehicle_id(&vehicle_id)?;
    vehicle_span("delete", vehicle_id)
        .in_scope(|| state.coordinator().delete_vehicle(vehicle_id))?;
    Ok(Json(MessageResponse::new("Vehicle deleted")))
}
