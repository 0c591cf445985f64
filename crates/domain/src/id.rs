//! Typed identifiers for greenhouses and the devices attached to them.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Registry-assigned identifier of a [`Greenhouse`](crate::greenhouse::Greenhouse).
///
/// Ids start at `1` and are never reused within one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GreenhouseId(u32);

impl GreenhouseId {
    /// Wrap a raw numeric id.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Access the raw numeric id.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for GreenhouseId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for GreenhouseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for GreenhouseId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Node-local identifier of an actuator or sensor, shaped `<Type>-<N>`.
///
/// Unique within one [`SensorNode`](crate::node::SensorNode) only; two
/// greenhouses may both own a `Fan-1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Build the id for the `n`-th device of `device_type`.
    #[must_use]
    pub fn numbered(device_type: &str, n: u32) -> Self {
        Self(format!("{device_type}-{n}"))
    }

    /// Borrow the id as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
