//! Parking coordinator.
//!
//! The coordinator owns the registry, slot table and session log behind a
//! single [`RwLock`]. Every mutation runs under the write guard, so concurrent
//! callers can never be handed the same slot, and a release racing a delete
//! of the same vehicle commits exactly one of the two. Reads take the read
//! guard and always see a consistent pairing of slots and vehicles.
//!
//! ## Vehicle lifecycle
//!
//! ```text
//! Registered --assign--> Parked --release--> Registered
//!     |                    |
//!     +------delete--------+--> Deleted   (forced release, no log entry)
//! ```

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::error::{ErrorKind, ParkingError, Result};
use crate::id::{SlotId, VehicleId};
use crate::observer::{NoopObserver, Occupancy, ParkingObserver};
use crate::registry::{Vehicle, VehicleRegistry};
use crate::session_log::{SessionLog, SessionLogEntry};
use crate::slots::{DEFAULT_SLOT_COUNT, Slot, SlotTable};

/// Everything the coordinator mutates, guarded as one unit.
#[derive(Debug, Clone)]
pub struct ParkingState {
    registry: VehicleRegistry,
    slots: SlotTable,
    log: SessionLog,
}

impl ParkingState {
    /// Creates empty state with `slot_count` free slots.
    #[must_use]
    pub fn new(slot_count: u32) -> Self {
        Self {
            registry: VehicleRegistry::new(),
            slots: SlotTable::new(slot_count),
            log: SessionLog::new(),
        }
    }

    /// Returns current occupancy counts.
    #[must_use]
    pub fn occupancy(&self) -> Occupancy {
        Occupancy {
            occupied: self.slots.occupied_count(),
            free: self.slots.free_count(),
        }
    }
}

/// A consistent copy of the whole facility.
#[derive(Debug, Clone, Serialize)]
pub struct ParkingSnapshot {
    /// Registered vehicles ordered by id.
    pub vehicles: Vec<Vehicle>,
    /// Slots ordered by id.
    pub slots: Vec<Slot>,
    /// Completed sessions in release order.
    pub logs: Vec<SessionLogEntry>,
}

fn poisoned<T>(_: PoisonError<T>) -> ParkingError {
    ParkingError::inconsistent("parking state lock poisoned")
}

/// Orchestrates slot assignment and release.
pub struct ParkingCoordinator {
    state: RwLock<ParkingState>,
    slot_count: u32,
    observer: Arc<dyn ParkingObserver>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ParkingCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParkingCoordinator")
            .field("slot_count", &self.slot_count)
            .field("observer", &"<ParkingObserver>")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl Default for ParkingCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_SLOT_COUNT)
    }
}

impl ParkingCoordinator {
    /// Creates a coordinator with `slot_count` slots, the system clock and no observer.
    #[must_use]
    pub fn new(slot_count: u32) -> Self {
        Self {
            state: RwLock::new(ParkingState::new(slot_count)),
            slot_count,
            observer: Arc::new(NoopObserver),
            clock: Arc::new(SystemClock),
        }
    }

    /// Attaches an observer notified after every committed transition.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ParkingObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the configured number of slots.
    #[must_use]
    pub const fn slot_count(&self) -> u32 {
        self.slot_count
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, ParkingState>> {
        self.state.read().map_err(poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, ParkingState>> {
        self.state.write().map_err(poisoned)
    }

    /// Logs the outcome of a failed operation and forwards internal failures to the observer.
    fn report<T>(&self, operation: &'static str, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            match err.kind() {
                ErrorKind::Internal => {
                    tracing::error!(op = operation, bug = true, error = %err, "Parking invariant violated");
                    self.observer.internal_error(operation, err);
                }
                kind => {
                    tracing::debug!(op = operation, kind = kind.as_str(), error = %err, "Parking request rejected");
                }
            }
        }
        result
    }

    /// Pushes the current occupancy to the observer.
    ///
    /// Called once at startup so gauges reflect the empty facility before the
    /// first transition.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the state lock is poisoned.
    pub fn publish_occupancy(&self) -> Result<()> {
        let state = self.report("publish_occupancy", self.read())?;
        self.observer.occupancy_changed(state.occupancy());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Registry operations
    // ------------------------------------------------------------------

    /// Registers a vehicle.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::InvalidPlate`] for a blank plate.
    pub fn register_vehicle(&self, plate: &str) -> Result<VehicleId> {
        let result = self.write().and_then(|mut state| state.registry.register(plate));
        let vehicle_id = self.report("register", result)?;
        tracing::info!(vehicle_id = %vehicle_id, plate = %plate.trim(), "Registered vehicle");
        Ok(vehicle_id)
    }

    /// Returns a copy of a vehicle record.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::VehicleNotFound`] if the id is not registered.
    pub fn vehicle(&self, vehicle_id: VehicleId) -> Result<Vehicle> {
        let result = self
            .read()
            .and_then(|state| state.registry.get(vehicle_id).cloned());
        self.report("get_vehicle", result)
    }

    /// Returns all registered vehicles ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the state lock is poisoned.
    pub fn vehicles(&self) -> Result<Vec<Vehicle>> {
        let result = self
            .read()
            .map(|state| state.registry.list().cloned().collect());
        self.report("list_vehicles", result)
    }

    /// Replaces a vehicle's plate.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::VehicleNotFound`] or [`ParkingError::InvalidPlate`].
    pub fn update_plate(&self, vehicle_id: VehicleId, plate: &str) -> Result<()> {
        let result = self
            .write()
            .and_then(|mut state| state.registry.update_plate(vehicle_id, plate));
        self.report("update_plate", result)?;
        tracing::info!(vehicle_id = %vehicle_id, plate = %plate.trim(), "Updated vehicle plate");
        Ok(())
    }

    /// Deletes a vehicle, force-freeing its slot without logging a session.
    ///
    /// Returns the slot that was freed, if the vehicle was parked.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::VehicleNotFound`] if the id is not registered.
    pub fn delete_vehicle(&self, vehicle_id: VehicleId) -> Result<Option<SlotId>> {
        let result = self.write().and_then(|mut state| {
            state.registry.get(vehicle_id)?;
            let freed = state.slots.slot_of(vehicle_id);
            if let Some(slot_id) = freed {
                state.slots.free(slot_id)?;
            }
            state.registry.remove(vehicle_id)?;
            if freed.is_some() {
                self.observer.occupancy_changed(state.occupancy());
            }
            Ok(freed)
        });
        let freed = self.report("delete_vehicle", result)?;
        match freed {
            Some(slot_id) => tracing::info!(
                vehicle_id = %vehicle_id,
                slot_id = %slot_id,
                "Deleted parked vehicle; slot freed without session log"
            ),
            None => tracing::info!(vehicle_id = %vehicle_id, "Deleted vehicle"),
        }
        Ok(freed)
    }

    // ------------------------------------------------------------------
    // Slot operations
    // ------------------------------------------------------------------

    /// Returns the slot table in ascending id order.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the state lock is poisoned.
    pub fn slots(&self) -> Result<Vec<Slot>> {
        let result = self.read().map(|state| state.slots.list().to_vec());
        self.report("list_slots", result)
    }

    /// Returns current occupancy counts.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the state lock is poisoned.
    pub fn occupancy(&self) -> Result<Occupancy> {
        let result = self.read().map(|state| state.occupancy());
        self.report("occupancy", result)
    }

    /// Assigns the lowest free slot to a vehicle.
    ///
    /// # Errors
    ///
    /// - [`ParkingError::VehicleNotFound`] if the vehicle is not registered
    /// - [`ParkingError::AlreadyParked`] if it already holds a slot
    /// - [`ParkingError::NoFreeSlots`] if every slot is occupied
    pub fn assign(&self, vehicle_id: VehicleId) -> Result<SlotId> {
        let result = self.write().and_then(|mut state| {
            if state.registry.get(vehicle_id)?.is_parked() {
                return Err(ParkingError::AlreadyParked { vehicle_id });
            }
            let slot_id = state.slots.find_free().ok_or(ParkingError::NoFreeSlots)?;
            let now = self.clock.now();

            state.slots.occupy(slot_id, vehicle_id)?;
            state.registry.get_mut(vehicle_id)?.entry_time = Some(now);

            self.observer.vehicle_entered(vehicle_id, slot_id);
            self.observer.occupancy_changed(state.occupancy());
            Ok(slot_id)
        });
        let slot_id = self.report("assign", result)?;
        tracing::info!(vehicle_id = %vehicle_id, slot_id = %slot_id, "Assigned vehicle to slot");
        Ok(slot_id)
    }

    /// Releases a slot and logs the completed session.
    ///
    /// Returns the parking duration in seconds.
    ///
    /// # Errors
    ///
    /// - [`ParkingError::InvalidSlot`] if the id is out of range
    /// - [`ParkingError::SlotAlreadyFree`] if the slot holds no vehicle
    /// - [`ParkingError::InconsistentState`] if the occupant has no record or no entry time
    pub fn release(&self, slot_id: SlotId) -> Result<f64> {
        let result = self.write().and_then(|mut state| {
            let slot = state.slots.get(slot_id)?;
            if !slot.occupied {
                return Err(ParkingError::SlotAlreadyFree { slot_id });
            }
            let vehicle_id = slot.vehicle_id.ok_or_else(|| {
                ParkingError::inconsistent(format!("slot {slot_id} is occupied without a vehicle"))
            })?;
            let entry_time = state
                .registry
                .get(vehicle_id)
                .map_err(|_| {
                    ParkingError::inconsistent(format!(
                        "slot {slot_id} references unregistered vehicle {vehicle_id}"
                    ))
                })?
                .entry_time
                .ok_or_else(|| {
                    ParkingError::inconsistent(format!(
                        "vehicle {vehicle_id} in slot {slot_id} has no entry time"
                    ))
                })?;

            let session = SessionLogEntry::new(vehicle_id, slot_id, entry_time, self.clock.now());
            state.slots.free(slot_id)?;
            state.registry.get_mut(vehicle_id)?.entry_time = None;
            state.log.append(session.clone());

            self.observer.vehicle_exited(&session);
            self.observer.occupancy_changed(state.occupancy());
            Ok(session)
        });
        let session = self.report("release", result)?;
        tracing::info!(
            vehicle_id = %session.vehicle_id,
            slot_id = %slot_id,
            duration_secs = session.duration_seconds,
            "Released slot"
        );
        Ok(session.duration_seconds)
    }

    // ------------------------------------------------------------------
    // Log and whole-state operations
    // ------------------------------------------------------------------

    /// Returns completed sessions in release order.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the state lock is poisoned.
    pub fn logs(&self) -> Result<Vec<SessionLogEntry>> {
        let result = self.read().map(|state| state.log.entries().to_vec());
        self.report("list_logs", result)
    }

    /// Returns vehicles, slots and logs read under one guard.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the state lock is poisoned.
    pub fn snapshot(&self) -> Result<ParkingSnapshot> {
        let result = self.read().map(|state| ParkingSnapshot {
            vehicles: state.registry.list().cloned().collect(),
            slots: state.slots.list().to_vec(),
            logs: state.log.entries().to_vec(),
        });
        self.report("snapshot", result)
    }

    /// Clears every vehicle, slot assignment and log entry.
    ///
    /// Vehicle ids restart at 1.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the state lock is poisoned.
    pub fn reset(&self) -> Result<()> {
        let result = self.write().map(|mut state| {
            *state = ParkingState::new(self.slot_count);
            self.observer.occupancy_changed(state.occupancy());
        });
        self.report("reset", result)?;
        tracing::info!(slot_count = self.slot_count, "Parking state reset");
        Ok(())
    }

    /// Runs `f` with exclusive access to the raw state.
    ///
    /// Bypasses every invariant check; only for injecting faults in tests.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn with_state_mut<T>(&self, f: impl FnOnce(&mut ParkingState) -> T) -> Result<T> {
        let mut state = self.write()?;
        Ok(f(&mut state))
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl ParkingState {
    /// Sets a vehicle's entry time directly, leaving the slot table untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::VehicleNotFound`] if the id is not registered.
    pub fn force_entry_time(
        &mut self,
        vehicle_id: VehicleId,
        entry_time: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<()> {
        self.registry.get_mut(vehicle_id)?.entry_time = entry_time;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::clock::SimulatedClock;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Entered(VehicleId, SlotId),
        Exited(VehicleId, f64),
        Occupancy(usize, usize),
        Internal(&'static str),
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<Event>>,
        panic_on_occupancy: AtomicBool,
    }

    impl RecordingObserver {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ParkingObserver for RecordingObserver {
        fn vehicle_entered(&self, vehicle_id: VehicleId, slot_id: SlotId) {
            self.events
                .lock()
                .unwrap()
                .push(Event::Entered(vehicle_id, slot_id));
        }

        fn vehicle_exited(&self, session: &SessionLogEntry) {
            self.events
                .lock()
                .unwrap()
                .push(Event::Exited(session.vehicle_id, session.duration_seconds));
        }

        fn occupancy_changed(&self, occupancy: Occupancy) {
            assert!(
                !self.panic_on_occupancy.load(Ordering::SeqCst),
                "observer failed while publishing occupancy"
            );
            self.events
                .lock()
                .unwrap()
                .push(Event::Occupancy(occupancy.occupied, occupancy.free));
        }

        fn internal_error(&self, operation: &'static str, _error: &ParkingError) {
            self.events.lock().unwrap().push(Event::Internal(operation));
        }
    }

    fn coordinator() -> (ParkingCoordinator, Arc<RecordingObserver>, Arc<SimulatedClock>) {
        let observer = Arc::new(RecordingObserver::default());
        let clock = Arc::new(SimulatedClock::deterministic());
        let coordinator = ParkingCoordinator::new(3)
            .with_observer(observer.clone())
            .with_clock(clock.clone());
        (coordinator, observer, clock)
    }

    #[test]
    fn assign_sets_entry_time_and_notifies() {
        let (coordinator, observer, clock) = coordinator();
        let id = coordinator.register_vehicle("ABC123").unwrap();

        let slot = coordinator.assign(id).unwrap();

        assert_eq!(slot, SlotId::new(1));
        assert_eq!(coordinator.vehicle(id).unwrap().entry_time, Some(clock.now()));
        assert_eq!(
            observer.events(),
            vec![Event::Entered(id, slot), Event::Occupancy(1, 2)]
        );
    }

    #[test]
    fn release_logs_session_with_clock_duration() {
        let (coordinator, observer, clock) = coordinator();
        let id = coordinator.register_vehicle("ABC123").unwrap();
        let slot = coordinator.assign(id).unwrap();

        clock.advance(Duration::from_secs(42));
        let duration = coordinator.release(slot).unwrap();

        assert!((duration - 42.0).abs() < 1e-9);
        let logs = coordinator.logs().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].vehicle_id, id);
        assert_eq!(logs[0].slot_id, slot);
        assert!(coordinator.vehicle(id).unwrap().entry_time.is_none());
        assert!(observer.events().contains(&Event::Exited(id, duration)));
        assert_eq!(observer.events().last(), Some(&Event::Occupancy(0, 3)));
    }

    #[test]
    fn backwards_clock_never_yields_negative_duration() {
        let (coordinator, _, clock) = coordinator();
        let id = coordinator.register_vehicle("ABC123").unwrap();
        let slot = coordinator.assign(id).unwrap();

        clock.rewind(Duration::from_secs(5));
        let duration = coordinator.release(slot).unwrap();

        assert!(duration >= 0.0);
        let entry = &coordinator.logs().unwrap()[0];
        assert!(entry.exit_time >= entry.entry_time);
    }

    #[test]
    fn rejected_assign_leaves_state_unchanged() {
        let (coordinator, observer, _) = coordinator();
        let id = coordinator.register_vehicle("ABC123").unwrap();
        coordinator.assign(id).unwrap();
        let before = coordinator.snapshot().unwrap();
        let events_before = observer.events().len();

        assert_eq!(
            coordinator.assign(id).unwrap_err(),
            ParkingError::AlreadyParked { vehicle_id: id }
        );
        assert_eq!(
            coordinator.assign(VehicleId::new(99)).unwrap_err().kind(),
            ErrorKind::NotFound
        );

        let after = coordinator.snapshot().unwrap();
        assert_eq!(before.vehicles, after.vehicles);
        assert_eq!(before.slots, after.slots);
        assert_eq!(observer.events().len(), events_before);
    }

    #[test]
    fn release_errors_by_slot_state() {
        let (coordinator, _, _) = coordinator();

        assert_eq!(
            coordinator.release(SlotId::new(4)).unwrap_err(),
            ParkingError::InvalidSlot {
                slot_id: SlotId::new(4)
            }
        );
        assert_eq!(
            coordinator.release(SlotId::new(2)).unwrap_err(),
            ParkingError::SlotAlreadyFree {
                slot_id: SlotId::new(2)
            }
        );
        assert!(coordinator.logs().unwrap().is_empty());
    }

    #[test]
    fn missing_entry_time_is_internal_and_reported() {
        let (coordinator, observer, _) = coordinator();
        let id = coordinator.register_vehicle("ABC123").unwrap();
        let slot = coordinator.assign(id).unwrap();
        coordinator
            .with_state_mut(|state| state.force_entry_time(id, None))
            .unwrap()
            .unwrap();

        let err = coordinator.release(slot).unwrap_err();

        assert!(err.is_internal());
        assert_eq!(observer.events().last(), Some(&Event::Internal("release")));
        // Nothing committed: slot still held, no session logged.
        assert!(coordinator.slots().unwrap()[0].occupied);
        assert!(coordinator.logs().unwrap().is_empty());
    }

    #[test]
    fn poisoned_lock_surfaces_as_internal_error() {
        let (coordinator, observer, _) = coordinator();
        let first = coordinator.register_vehicle("ABC123").unwrap();
        let second = coordinator.register_vehicle("XYZ789").unwrap();

        observer.panic_on_occupancy.store(true, Ordering::SeqCst);
        let outcome = catch_unwind(AssertUnwindSafe(|| coordinator.assign(first)));
        assert!(outcome.is_err(), "observer panic must unwind through assign");
        observer.panic_on_occupancy.store(false, Ordering::SeqCst);

        let err = coordinator.assign(second).unwrap_err();
        assert!(err.is_internal());
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(coordinator.slots().unwrap_err().is_internal());
        assert!(coordinator.release(SlotId::new(1)).unwrap_err().is_internal());

        let internal: Vec<Event> = observer
            .events()
            .into_iter()
            .filter(|event| matches!(event, Event::Internal(_)))
            .collect();
        assert_eq!(
            internal,
            vec![
                Event::Internal("assign"),
                Event::Internal("list_slots"),
                Event::Internal("release"),
            ]
        );
    }

    #[test]
    fn delete_parked_vehicle_frees_slot_without_logging() {
        let (coordinator, observer, _) = coordinator();
        let id = coordinator.register_vehicle("ABC123").unwrap();
        let slot = coordinator.assign(id).unwrap();

        assert_eq!(coordinator.delete_vehicle(id).unwrap(), Some(slot));

        assert!(coordinator.slots().unwrap().iter().all(|s| !s.occupied));
        assert!(coordinator.logs().unwrap().is_empty());
        assert!(coordinator.vehicle(id).is_err());
        assert_eq!(observer.events().last(), Some(&Event::Occupancy(0, 3)));
    }

    #[test]
    fn delete_unparked_vehicle_reports_no_slot() {
        let (coordinator, observer, _) = coordinator();
        let id = coordinator.register_vehicle("ABC123").unwrap();

        assert_eq!(coordinator.delete_vehicle(id).unwrap(), None);
        assert!(observer.events().is_empty());
        assert_eq!(
            coordinator.delete_vehicle(id).unwrap_err(),
            ParkingError::VehicleNotFound { vehicle_id: id }
        );
    }

    #[test]
    fn reset_restores_initial_state_and_ids() {
        let (coordinator, observer, _) = coordinator();
        let id = coordinator.register_vehicle("ABC123").unwrap();
        let slot = coordinator.assign(id).unwrap();
        coordinator.release(slot).unwrap();
        coordinator.assign(id).unwrap();

        coordinator.reset().unwrap();

        let snapshot = coordinator.snapshot().unwrap();
        assert!(snapshot.vehicles.is_empty());
        assert!(snapshot.logs.is_empty());
        assert_eq!(snapshot.slots.len(), 3);
        assert!(snapshot.slots.iter().all(|s| !s.occupied && s.vehicle_id.is_none()));
        assert_eq!(observer.events().last(), Some(&Event::Occupancy(0, 3)));
        assert_eq!(
            coordinator.register_vehicle("NEW001").unwrap(),
            VehicleId::new(1)
        );
    }

    #[test]
    fn publish_occupancy_reports_empty_facility() {
        let (coordinator, observer, _) = coordinator();
        coordinator.publish_occupancy().unwrap();
        assert_eq!(observer.events(), vec![Event::Occupancy(0, 3)]);
    }
}
