//! Error types and result aliases for parking operations.
//!
//! Every coordinator operation either commits all of its state changes or
//! returns one of these errors with the state left untouched.

use crate::id::{SlotId, VehicleId};

/// The result type used throughout the parking core.
pub type Result<T> = std::result::Result<T, ParkingError>;

/// Coarse classification of a [`ParkingError`].
///
/// Client-facing kinds describe a rejected request; [`ErrorKind::Internal`]
/// means an invariant was broken and should be treated as a bug signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The referenced vehicle or slot does not exist.
    NotFound,
    /// The request conflicts with the current state (already parked, already free).
    Conflict,
    /// No free slot is available.
    ResourceExhausted,
    /// The request carried a malformed value.
    InvalidInput,
    /// Internal state is inconsistent.
    Internal,
}

impl ErrorKind {
    /// Returns a stable lowercase label for logs and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::ResourceExhausted => "resource_exhausted",
            Self::InvalidInput => "invalid_input",
            Self::Internal => "internal",
        }
    }
}

/// Errors that can occur in parking operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParkingError {
    /// The vehicle is not registered.
    #[error("vehicle not found: {vehicle_id}")]
    VehicleNotFound {
        /// The identifier that was looked up.
        vehicle_id: VehicleId,
    },

    /// The slot id is outside the configured range.
    #[error("invalid slot id: {slot_id}")]
    InvalidSlot {
        /// The slot id that was requested.
        slot_id: SlotId,
    },

    /// The vehicle already occupies a slot.
    #[error("vehicle {vehicle_id} already parked")]
    AlreadyParked {
        /// The parked vehicle.
        vehicle_id: VehicleId,
    },

    /// The slot holds no vehicle.
    #[error("slot {slot_id} already free")]
    SlotAlreadyFree {
        /// The free slot.
        slot_id: SlotId,
    },

    /// Every slot is occupied.
    #[error("no free slots available")]
    NoFreeSlots,

    /// An occupied slot points at a vehicle that has no entry time or no record.
    #[error("inconsistent state: {message}")]
    InconsistentState {
        /// Description of the broken invariant.
        message: String,
    },

    /// A plate value was rejected.
    #[error("invalid plate: {message}")]
    InvalidPlate {
        /// Why the plate was rejected.
        message: String,
    },
}

impl ParkingError {
    /// Creates an inconsistent-state error with the given message.
    #[must_use]
    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::InconsistentState {
            message: message.into(),
        }
    }

    /// Returns the coarse kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::VehicleNotFound { .. } | Self::InvalidSlot { .. } => ErrorKind::NotFound,
            Self::AlreadyParked { .. } | Self::SlotAlreadyFree { .. } => ErrorKind::Conflict,
            Self::NoFreeSlots => ErrorKind::ResourceExhausted,
            Self::InvalidPlate { .. } => ErrorKind::InvalidInput,
            Self::InconsistentState { .. } => ErrorKind::Internal,
        }
    }

    /// Returns true when the error signals a broken invariant rather than a rejected request.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        let vehicle_id = VehicleId::new(7);
        let slot_id = SlotId::new(2);

        assert_eq!(
            ParkingError::VehicleNotFound { vehicle_id }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(ParkingError::InvalidSlot { slot_id }.kind(), ErrorKind::NotFound);
        assert_eq!(
            ParkingError::AlreadyParked { vehicle_id }.kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            ParkingError::SlotAlreadyFree { slot_id }.kind(),
            ErrorKind::Conflict
        );
        assert_eq!(ParkingError::NoFreeSlots.kind(), ErrorKind::ResourceExhausted);
        assert!(ParkingError::inconsistent("missing entry time").is_internal());
        assert!(!ParkingError::NoFreeSlots.is_internal());
    }

    #[test]
    fn messages_name_the_offending_id() {
        let err = ParkingError::SlotAlreadyFree {
            slot_id: SlotId::new(3),
        };
        assert_eq!(err.to_string(), "slot 3 already free");

        let err = ParkingError::VehicleNotFound {
            vehicle_id: VehicleId::new(12),
        };
        assert_eq!(err.to_string(), "vehicle not found: 12");
    }
}
