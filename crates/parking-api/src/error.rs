//! API error types and HTTP response mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use parking_core::error::ParkingError;

/// API result type.
pub type ApiResult<T> = Result<T, ApiError>;

/// Standard JSON error response body.
#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ApiErrorBody {
    /// Stable machine-readable error code.
    pub code: String,
    /// Human-readable message (safe for clients).
    pub error: String,
}

/// HTTP API error with stable machine-readable code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Returns an error response for invalid input.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    /// Returns an error response for missing resources.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    /// Returns the response for an unknown vehicle.
    pub fn vehicle_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "VEHICLE_NOT_FOUND", "Vehicle not found")
    }

    /// Returns the response for a slot id outside the table.
    pub fn invalid_slot() -> Self {
        Self::new(StatusCode::NOT_FOUND, "INVALID_SLOT", "Invalid slot ID")
    }

    /// Returns an internal error response.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", message)
    }

    /// Returns an error response when a request times out.
    pub fn request_timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::REQUEST_TIMEOUT, "REQUEST_TIMEOUT", message)
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the stable machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Returns the human-readable error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ApiErrorBody {
                code: self.code.to_string(),
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<ParkingError> for ApiError {
    fn from(value: ParkingError) -> Self {
        match value {
            ParkingError::VehicleNotFound { .. } => Self::vehicle_not_found(),
            ParkingError::InvalidSlot { .. } => Self::invalid_slot(),
            ParkingError::AlreadyParked { .. } => Self::new(
                StatusCode::BAD_REQUEST,
                "ALREADY_PARKED",
                "Vehicle already parked",
            ),
            ParkingError::SlotAlreadyFree { .. } => Self::new(
                StatusCode::BAD_REQUEST,
                "SLOT_ALREADY_FREE",
                "Slot already free",
            ),
            ParkingError::NoFreeSlots => Self::new(
                StatusCode::FORBIDDEN,
                "NO_FREE_SLOTS",
                "No free slots available",
            ),
            ParkingError::InvalidPlate { message } => Self::bad_request(message),
            ParkingError::InconsistentState { message } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INCONSISTENT_STATE",
                format!("Vehicle was not assigned properly: {message}"),
            ),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::bad_request(value.body_text())
    }
}
