//! Vehicle registry.
//!
//! Owns vehicle records keyed by [`VehicleId`]. Ids come from a monotonic
//! counter, so a deleted vehicle's id is never handed out again until the
//! registry is cleared.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ParkingError, Result};
use crate::id::VehicleId;

/// A registered vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Vehicle identifier.
    pub id: VehicleId,
    /// License plate.
    pub plate: String,
    /// When the vehicle entered its current slot; `None` while unparked.
    pub entry_time: Option<DateTime<Utc>>,
}

impl Vehicle {
    /// Returns true while the vehicle occupies a slot.
    #[must_use]
    pub const fn is_parked(&self) -> bool {
        self.entry_time.is_some()
    }
}

/// In-memory vehicle registry.
#[derive(Debug, Clone)]
pub struct VehicleRegistry {
    vehicles: BTreeMap<VehicleId, Vehicle>,
    next_id: u64,
}

impl Default for VehicleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl VehicleRegistry {
    /// Creates an empty registry whose first id is 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            vehicles: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Registers a vehicle and returns its freshly allocated id.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::InvalidPlate`] if the plate is blank.
    pub fn register(&mut self, plate: &str) -> Result<VehicleId> {
        let plate = normalize_plate(plate)?;
        let id = VehicleId::new(self.next_id);
        self.next_id += 1;
        self.vehicles.insert(
            id,
            Vehicle {
                id,
                plate,
                entry_time: None,
            },
        );
        Ok(id)
    }

    /// Returns the vehicle with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::VehicleNotFound`] if the id is not registered.
    pub fn get(&self, vehicle_id: VehicleId) -> Result<&Vehicle> {
        self.vehicles
            .get(&vehicle_id)
            .ok_or(ParkingError::VehicleNotFound { vehicle_id })
    }

    pub(crate) fn get_mut(&mut self, vehicle_id: VehicleId) -> Result<&mut Vehicle> {
        self.vehicles
            .get_mut(&vehicle_id)
            .ok_or(ParkingError::VehicleNotFound { vehicle_id })
    }

    /// Replaces the plate of a vehicle, leaving its entry time untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::VehicleNotFound`] if the id is not registered,
    /// or [`ParkingError::InvalidPlate`] if the plate is blank.
    pub fn update_plate(&mut self, vehicle_id: VehicleId, plate: &str) -> Result<()> {
        let vehicle = self.get_mut(vehicle_id)?;
        vehicle.plate = normalize_plate(plate)?;
        Ok(())
    }

    /// Removes a vehicle record.
    ///
    /// Slot bookkeeping is the coordinator's job; call this only after any
    /// slot held by the vehicle has been freed.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::VehicleNotFound`] if the id is not registered.
    pub(crate) fn remove(&mut self, vehicle_id: VehicleId) -> Result<Vehicle> {
        self.vehicles
            .remove(&vehicle_id)
            .ok_or(ParkingError::VehicleNotFound { vehicle_id })
    }

    /// Returns all vehicles ordered by id.
    pub fn list(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    /// Returns the number of registered vehicles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    /// Returns true if no vehicles are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Returns the number of vehicles with an entry time.
    #[must_use]
    pub fn parked_count(&self) -> usize {
        self.vehicles.values().filter(|v| v.is_parked()).count()
    }
}

fn normalize_plate(plate: &str) -> Result<String> {
    let trimmed = plate.trim();
    if trimmed.is_empty() {
        return Err(ParkingError::InvalidPlate {
            message: "plate must not be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_allocates_sequential_ids() {
        let mut registry = VehicleRegistry::new();
        let a = registry.register("ABC123").unwrap();
        let b = registry.register("XYZ789").unwrap();

        assert_eq!(a, VehicleId::new(1));
        assert_eq!(b, VehicleId::new(2));
        assert_eq!(registry.get(a).unwrap().plate, "ABC123");
        assert!(registry.get(a).unwrap().entry_time.is_none());
        assert_eq!(registry.parked_count(), 0);
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut registry = VehicleRegistry::new();
        let first = registry.register("ABC123").unwrap();
        let second = registry.register("XYZ789").unwrap();
        registry.remove(first).unwrap();

        let third = registry.register("LMN456").unwrap();
        assert_ne!(third, first);
        assert_ne!(third, second);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn update_plate_keeps_entry_time() {
        let mut registry = VehicleRegistry::new();
        let id = registry.register("ABC123").unwrap();
        let now = Utc::now();
        registry.get_mut(id).unwrap().entry_time = Some(now);

        registry.update_plate(id, "  NEW001 ").unwrap();

        let vehicle = registry.get(id).unwrap();
        assert_eq!(vehicle.plate, "NEW001");
        assert_eq!(vehicle.entry_time, Some(now));
        assert_eq!(registry.parked_count(), 1);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let mut registry = VehicleRegistry::new();
        let missing = VehicleId::new(99);

        assert_eq!(
            registry.get(missing).unwrap_err(),
            ParkingError::VehicleNotFound { vehicle_id: missing }
        );
        assert!(registry.update_plate(missing, "ABC").is_err());
        assert!(registry.remove(missing).is_err());
    }

    #[test]
    fn blank_plates_are_rejected() {
        let mut registry = VehicleRegistry::new();
        assert!(matches!(
            registry.register("   "),
            Err(ParkingError::InvalidPlate { .. })
        ));
        assert!(registry.is_empty());

        let id = registry.register("ABC123").unwrap();
        assert!(registry.update_plate(id, "").is_err());
        assert_eq!(registry.get(id).unwrap().plate, "ABC123");
    }
}
