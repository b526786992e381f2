//! Fixed-size slot table.

use serde::{Deserialize, Serialize};

use crate::error::{ParkingError, Result};
use crate::id::{SlotId, VehicleId};

/// Number of slots in the default facility.
pub const DEFAULT_SLOT_COUNT: u32 = 3;

/// A parking slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Slot identifier, numbered from 1.
    pub id: SlotId,
    /// Whether a vehicle currently holds the slot.
    pub occupied: bool,
    /// The vehicle holding the slot.
    pub vehicle_id: Option<VehicleId>,
}

/// Slots `1..=N`, created once and never resized.
#[derive(Debug, Clone)]
pub struct SlotTable {
    // Index `i` holds slot `i + 1`.
    slots: Vec<Slot>,
}

impl SlotTable {
    /// Creates a table of `count` unoccupied slots.
    #[must_use]
    pub fn new(count: u32) -> Self {
        let slots = (1..=count)
            .map(|id| Slot {
                id: SlotId::new(id),
                occupied: false,
                vehicle_id: None,
            })
            .collect();
        Self { slots }
    }

    /// Returns all slots in ascending id order.
    #[must_use]
    pub fn list(&self) -> &[Slot] {
        &self.slots
    }

    /// Returns the slot with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::InvalidSlot`] if the id is out of range.
    pub fn get(&self, slot_id: SlotId) -> Result<&Slot> {
        self.index(slot_id).map(|i| &self.slots[i])
    }

    /// Returns the lowest-numbered unoccupied slot.
    #[must_use]
    pub fn find_free(&self) -> Option<SlotId> {
        self.slots.iter().find(|s| !s.occupied).map(|s| s.id)
    }

    /// Returns the slot currently held by `vehicle_id`.
    #[must_use]
    pub fn slot_of(&self, vehicle_id: VehicleId) -> Option<SlotId> {
        self.slots
            .iter()
            .find(|s| s.vehicle_id == Some(vehicle_id))
            .map(|s| s.id)
    }

    /// Total number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.occupied).count()
    }

    /// Number of free slots.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.capacity() - self.occupied_count()
    }

    pub(crate) fn occupy(&mut self, slot_id: SlotId, vehicle_id: VehicleId) -> Result<()> {
        let i = self.index(slot_id)?;
        let slot = &mut self.slots[i];
        if slot.occupied {
            return Err(ParkingError::inconsistent(format!(
                "slot {slot_id} is already held by another vehicle"
            )));
        }
        slot.occupied = true;
        slot.vehicle_id = Some(vehicle_id);
        Ok(())
    }

    /// Frees a slot, returning the vehicle that held it.
    pub(crate) fn free(&mut self, slot_id: SlotId) -> Result<VehicleId> {
        let i = self.index(slot_id)?;
        let slot = &mut self.slots[i];
        let vehicle_id = match (slot.occupied, slot.vehicle_id) {
            (true, Some(vehicle_id)) => vehicle_id,
            (false, _) => return Err(ParkingError::SlotAlreadyFree { slot_id }),
            (true, None) => {
                return Err(ParkingError::inconsistent(format!(
                    "slot {slot_id} is occupied without a vehicle"
                )));
            }
        };
        slot.occupied = false;
        slot.vehicle_id = None;
        Ok(vehicle_id)
    }

    fn index(&self, slot_id: SlotId) -> Result<usize> {
        let raw = slot_id.get() as usize;
        if raw == 0 || raw > self.slots.len() {
            return Err(ParkingError::InvalidSlot { slot_id });
        }
        Ok(raw - 1)
    }
}

impl Default for SlotTable {
    fn default() -> Self {
        Self::new(DEFAULT_SLOT_COUNT)
    }
}
