//! Strongly-typed identifiers for vehicles and slots.
//!
//! Vehicle ids are allocated from a monotonic counter and travel over the wire
//! as decimal strings. Slot ids are small integers fixed at startup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A unique identifier for a registered vehicle.
///
/// Ids are never reused, even after the vehicle is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct VehicleId(u64);

impl VehicleId {
    /// Creates a vehicle id from its raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a string is not a valid identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} id '{value}'")]
pub struct ParseIdError {
    kind: &'static str,
    value: String,
}

/// Parses the canonical decimal form only: no sign, no padding, no leading zeros.
fn parse_canonical<T>(s: &str, kind: &'static str) -> Result<T, ParseIdError>
where
    T: FromStr + fmt::Display,
{
    s.parse::<T>()
        .ok()
        .filter(|value| value.to_string() == s)
        .ok_or_else(|| ParseIdError {
            kind,
            value: s.to_string(),
        })
}

impl FromStr for VehicleId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_canonical::<u64>(s, "vehicle").map(Self)
    }
}

impl From<VehicleId> for String {
    fn from(value: VehicleId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for VehicleId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Identifier of a parking slot, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(u32);

impl SlotId {
    /// Creates a slot id from its raw value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SlotId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_canonical::<u32>(s, "slot").map(Self)
    }
}
