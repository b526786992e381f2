//! `OpenAPI` (3.1) specification generation for `parking-api`.

use utoipa::OpenApi;

/// `OpenAPI` documentation for the parking REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Parking API",
        description = "Vehicle registration, slot assignment and parking session history"
    ),
    paths(
        crate::routes::vehicles::register_vehicle,
        crate::routes::vehicles::get_vehicle,
        crate::routes::vehicles::update_vehicle,
        crate::routes::vehicles::delete_vehicle,
        crate::routes::slots::list_slots,
        crate::routes::slots::assign_slot,
        crate::routes::slots::release_slot,
        crate::routes::logs::list_logs,
        crate::routes::admin::reset_system,
        crate::server::health,
    ),
    components(
        schemas(
            crate::error::ApiErrorBody,
            crate::routes::MessageResponse,
            crate::routes::vehicles::RegisterVehicleRequest,
            crate::routes::vehicles::RegisterVehicleResponse,
            crate::routes::vehicles::UpdateVehicleRequest,
            crate::routes::vehicles::VehicleResponse,
            crate::routes::slots::SlotResponse,
            crate::routes::slots::AssignResponse,
            crate::routes::slots::ReleaseResponse,
            crate::routes::logs::LogEntryResponse,
            crate::server::HealthResponse,
        )
    ),
    tags(
        (name = "vehicles", description = "Vehicle registry"),
        (name = "slots", description = "Slot assignment and release"),
        (name = "logs", description = "Completed parking sessions"),
        (name = "admin", description = "Health and reset"),
    ),
)]
pub struct ApiDoc;

/// Returns the generated `OpenAPI` spec.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Returns the generated `OpenAPI` spec serialized as pretty JSON.
///
/// # Errors
///
/// Returns an error if JSON serialization fails (should not happen).
pub fn openapi_json() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = openapi();
        for path in [
            "/vehicles",
            "/vehicles/{vehicle_id}",
            "/slots",
            "/assign/{vehicle_id}",
            "/release/{slot_id}",
            "/logs",
            "/reset",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn json_round_trips() {
        let json = openapi_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["info"]["title"], "Parking API");
    }

    #[test]
    fn version_follows_package_version() {
        assert_eq!(openapi().info.version, env!("CARGO_PKG_VERSION"));
    }
}
