//! Session log route.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::SecondsFormat;
use serde::Serialize;
use utoipa::ToSchema;

use parking_core::session_log::SessionLogEntry;

use crate::error::ApiResult;
use crate::server::AppState;

/// A completed parking session.
#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct LogEntryResponse {
    /// Vehicle that parked.
    pub vehicle_id: String,
    /// Entry timestamp (RFC 3339).
    pub entry_time: String,
    /// Exit timestamp (RFC 3339).
    pub exit_time: String,
    /// Seconds parked, rounded to two decimals.
    pub duration: f64,
}

impl From<SessionLogEntry> for LogEntryResponse {
    fn from(entry: SessionLogEntry) -> Self {
        Self {
            vehicle_id: entry.vehicle_id.to_string(),
            entry_time: entry
                .entry_time
                .to_rfc3339_opts(SecondsFormat::Micros, true),
            exit_time: entry.exit_time.to_rfc3339_opts(SecondsFormat::Micros, true),
            duration: round_to_hundredths(entry.duration_seconds),
        }
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Creates log routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/logs", get(list_logs))
}

/// List completed sessions in release order.
#[utoipa::path(
    get,
    path = "/logs",
    tag = "logs",
    responses(
        (status = 200, description = "Completed sessions", body = [LogEntryResponse]),
    )
)]
pub(crate) async fn list_logs(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<LogEntryResponse>>> {
    let logs = state.coordinator().logs()?;
    Ok(Json(logs.into_iter().map(LogEntryResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use parking_core::id::{SlotId, VehicleId};

    #[test]
    fn duration_is_rounded_to_two_decimals() {
        assert!((round_to_hundredths(7.256) - 7.26).abs() < f64::EPSILON);
        assert!((round_to_hundredths(0.004) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn log_entry_response_shape() {
        let entry_time: DateTime<Utc> = DateTime::from_timestamp(0, 0).unwrap();
        let entry = SessionLogEntry::new(
            VehicleId::new(4),
            SlotId::new(1),
            entry_time,
            entry_time + Duration::milliseconds(1_234),
        );

        let response = LogEntryResponse::from(entry);

        assert_eq!(response.vehicle_id, "4");
        assert_eq!(response.entry_time, "1970-01-01T00:00:00.000000Z");
        assert_eq!(response.exit_time, "1970-01-01T00:00:01.234000Z");
        assert!((response.duration - 1.23).abs() < f64::EPSILON);
    }
}
