//! Append-only log of completed parking sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{SlotId, VehicleId};

/// A completed parking session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLogEntry {
    /// The vehicle that parked.
    pub vehicle_id: VehicleId,
    /// The slot it occupied.
    pub slot_id: SlotId,
    /// When the vehicle was assigned.
    pub entry_time: DateTime<Utc>,
    /// When the slot was released.
    pub exit_time: DateTime<Utc>,
    /// `exit_time - entry_time` in seconds; never negative.
    pub duration_seconds: f64,
}

impl SessionLogEntry {
    /// Builds an entry, clamping a backwards clock so `exit_time >= entry_time`.
    #[must_use]
    pub fn new(
        vehicle_id: VehicleId,
        slot_id: SlotId,
        entry_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        let exit_time = now.max(entry_time);
        let duration_seconds = duration_secs(exit_time - entry_time);
        Self {
            vehicle_id,
            slot_id,
            entry_time,
            exit_time,
            duration_seconds,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn duration_secs(delta: chrono::TimeDelta) -> f64 {
    delta
        .num_microseconds()
        .map_or_else(|| delta.num_seconds() as f64, |us| us as f64 / 1_000_000.0)
}

/// Sessions in release order.
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    entries: Vec<SessionLogEntry>,
}

impl SessionLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, entry: SessionLogEntry) {
        self.entries.push(entry);
    }

    /// Returns all entries, oldest release first.
    #[must_use]
    pub fn entries(&self) -> &[SessionLogEntry] {
        &self.entries
    }

    /// Returns the number of logged sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no session has been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
