//! Observer hooks for committed state transitions.
//!
//! The coordinator calls an injected [`ParkingObserver`] after each committed
//! transition. Observers are side-effect sinks: they cannot fail, and they are
//! never consulted for decisions.

use serde::Serialize;

use crate::error::ParkingError;
use crate::id::{SlotId, VehicleId};
use crate::session_log::SessionLogEntry;

/// Slot occupancy counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occupancy {
    /// Number of occupied slots.
    pub occupied: usize,
    /// Number of free slots.
    pub free: usize,
}

/// Receives notifications about committed parking transitions.
///
/// Implementations are called while the coordinator holds its state lock, so
/// they must return promptly and must not call back into the coordinator.
pub trait ParkingObserver: Send + Sync {
    /// A vehicle was assigned a slot.
    fn vehicle_entered(&self, vehicle_id: VehicleId, slot_id: SlotId) {
        let _ = (vehicle_id, slot_id);
    }

    /// A slot was released and its session logged.
    fn vehicle_exited(&self, session: &SessionLogEntry) {
        let _ = session;
    }

    /// Slot occupancy after a transition (or at startup).
    fn occupancy_changed(&self, occupancy: Occupancy) {
        let _ = occupancy;
    }

    /// An operation failed because an invariant was broken.
    fn internal_error(&self, operation: &'static str, error: &ParkingError) {
        let _ = (operation, error);
    }
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ParkingObserver for NoopObserver {}
