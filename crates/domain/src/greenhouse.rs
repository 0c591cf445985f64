//! Greenhouse: the mutable climate of one greenhouse.
//!
//! Holds temperature, humidity, and light. Actuators push these values around
//! through the `change_*` operations; sensors only read them.
//!
//! This type carries no lock of its own. The registry in the `app` crate
//! serializes access to it.

use serde::{Deserialize, Serialize};

use crate::id::GreenhouseId;

/// Temperature a freshly registered greenhouse starts at, in °C.
pub const DEFAULT_TEMPERATURE: f64 = 14.0;
/// Relative humidity a freshly registered greenhouse starts at, in percent.
pub const DEFAULT_HUMIDITY: i32 = 60;
/// Light level a freshly registered greenhouse starts at, in lux.
pub const DEFAULT_LIGHT: i32 = 1000;

/// Lowest storable humidity.
pub const MIN_HUMIDITY: i32 = 0;
/// Highest storable humidity.
pub const MAX_HUMIDITY: i32 = 100;

/// Climate state of one greenhouse.
///
/// Humidity is always within [`MIN_HUMIDITY`]..=[`MAX_HUMIDITY`]. Temperature
/// and light are not clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct Greenhouse {
    id: GreenhouseId,
    name: String,
    temperature: f64,
    humidity: i32,
    light: i32,
}

impl Greenhouse {
    /// Create a greenhouse with the default climate.
    #[must_use]
    pub fn new(id: GreenhouseId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            temperature: DEFAULT_TEMPERATURE,
            humidity: DEFAULT_HUMIDITY,
            light: DEFAULT_LIGHT,
        }
    }

    /// The id assigned at registration. It never changes afterwards.
    #[must_use]
    pub fn id(&self) -> GreenhouseId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the greenhouse. Empty names and duplicates are allowed.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    #[must_use]
    pub fn humidity(&self) -> i32 {
        self.humidity
    }

    #[must_use]
    pub fn light(&self) -> i32 {
        self.light
    }

    /// Add `delta` degrees. Returns the delta that was applied.
    pub fn change_temperature(&mut self, delta: i32) -> i32 {
        self.temperature += f64::from(delta);
        delta
    }

    /// Add `delta` percent, saturating at the humidity bounds.
    ///
    /// Returns the delta that was actually applied, which differs from
    /// `delta` only when the result was clamped.
    pub fn change_humidity(&mut self, delta: i32) -> i32 {
        let before = self.humidity;
        self.humidity = before
            .saturating_add(delta)
            .clamp(MIN_HUMIDITY, MAX_HUMIDITY);
        self.humidity - before
    }

    /// Add `delta` lux. Returns the delta that was applied.
    pub fn change_light(&mut self, delta: i32) -> i32 {
        let before = self.light;
        self.light = before.saturating_add(delta);
        self.light - before
    }

    /// Copy out the current state for listing.
    #[must_use]
    pub fn summary(&self) -> GreenhouseSummary {
        GreenhouseSummary {
            id: self.id,
            name: self.name.clone(),
            temperature: self.temperature,
            humidity: self.humidity,
            light: self.light,
        }
    }
}

/// Point-in-time copy of a greenhouse, as sent in greenhouse listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreenhouseSummary {
    pub id: GreenhouseId,
    pub name: String,
    pub temperature: f64,
    pub humidity: i32,
    pub light: i32,
}
