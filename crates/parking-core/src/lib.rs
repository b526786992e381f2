//! # parking-core
//!
//! State machine for a small parking facility.
//!
//! - **Vehicle Registry**: vehicle records with monotonic ids
//! - **Slot Table**: a fixed set of slots, lowest free slot first
//! - **Session Log**: append-only record of completed parking sessions
//! - **Parking Coordinator**: assignment, release, deletion and reset under one lock
//!
//! Metrics and other side effects hang off the [`observer::ParkingObserver`]
//! trait; the core never depends on a metrics backend.
//!
//! ## Example
//!
//! ```rust
//! use parking_core::prelude::*;
//!
//! let coordinator = ParkingCoordinator::new(3);
//! let vehicle = coordinator.register_vehicle("ABC123")?;
//! let slot = coordinator.assign(vehicle)?;
//! assert_eq!(slot, SlotId::new(1));
//!
//! let duration = coordinator.release(slot)?;
//! assert!(duration >= 0.0);
//! assert_eq!(coordinator.logs()?.len(), 1);
//! # Ok::<(), ParkingError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod clock;
pub mod coordinator;
pub mod error;
pub mod id;
pub mod observability;
pub mod observer;
pub mod registry;
pub mod session_log;
pub mod slots;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::clock::{Clock, SimulatedClock, SystemClock};
    pub use crate::coordinator::{ParkingCoordinator, ParkingSnapshot};
    pub use crate::error::{ErrorKind, ParkingError, Result};
    pub use crate::id::{SlotId, VehicleId};
    pub use crate::observer::{NoopObserver, Occupancy, ParkingObserver};
    pub use crate::registry::Vehicle;
    pub use crate::session_log::SessionLogEntry;
    pub use crate::slots::{DEFAULT_SLOT_COUNT, Slot};
}
