//! Sensors: stateless readers of one greenhouse attribute.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InvalidDeviceTypeError;
use crate::greenhouse::Greenhouse;
use crate::id::DeviceId;

/// The closed set of sensor variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    Temperature,
    Humidity,
    Light,
}

impl SensorKind {
    /// All variants, in declaration order.
    pub const ALL: [Self; 3] = [Self::Temperature, Self::Humidity, Self::Light];

    /// Type name used as the id prefix and on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Temperature => "Temperature",
            Self::Humidity => "Humidity",
            Self::Light => "Light",
        }
    }

    /// Unit of the values this variant reports.
    #[must_use]
    pub fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "Celsius",
            Self::Humidity => "Percentage",
            Self::Light => "Lux",
        }
    }

    /// Project the matching attribute out of `greenhouse`.
    #[must_use]
    pub fn read(self, greenhouse: &Greenhouse) -> f64 {
        match self {
            Self::Temperature => greenhouse.temperature(),
            Self::Humidity => f64::from(greenhouse.humidity()),
            Self::Light => f64::from(greenhouse.light()),
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorKind {
    type Err = InvalidDeviceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| InvalidDeviceTypeError {
                family: "Sensor",
                value: s.to_string(),
            })
    }
}

/// A sensor attached to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sensor {
    id: DeviceId,
    kind: SensorKind,
}

impl Sensor {
    /// Create a detached sensor; the node assigns its id on insertion.
    #[must_use]
    pub fn new(kind: SensorKind) -> Self {
        Self {
            id: DeviceId::from(""),
            kind,
        }
    }

    #[must_use]
    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    pub(crate) fn set_id(&mut self, id: DeviceId) {
        self.id = id;
    }

    #[must_use]
    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    #[must_use]
    pub fn unit(&self) -> &'static str {
        self.kind.unit()
    }

    /// Current value of the attribute this sensor observes.
    #[must_use]
    pub fn read(&self, greenhouse: &Greenhouse) -> f64 {
        self.kind.read(greenhouse)
    }

    /// Read the value together with its unit.
    #[must_use]
    pub fn reading(&self, greenhouse: &Greenhouse) -> SensorReading {
        SensorReading {
            value: self.read(greenhouse),
            unit: self.unit().to_string(),
        }
    }
}

/// A value and its unit, as reported by a sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub value: f64,
    pub unit: String,
}
