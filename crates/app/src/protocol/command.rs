//! Command payloads, the typed `body` of an envelope.
//!
//! Payloads carry no type tag of their own; the envelope's `messageType`
//! selects the variant (see [`MessageType`](super::MessageType)).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use greenhub_domain::actuator::ActuatorStatus;
use greenhub_domain::greenhouse::GreenhouseSummary;
use greenhub_domain::id::{DeviceId, GreenhouseId};
use greenhub_domain::sensor::SensorReading;

use super::MessageType;

/// Device id placeholder selecting every device of the requested kind.
pub const ALL_DEVICES: &str = "ALL";

/// A request or reply payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// List every greenhouse. Travels without a body.
    GetAllGreenhouses,
    CreateGreenhouse(CreateGreenhouse),
    RemoveGreenhouse(RemoveGreenhouse),
    DataRequest(DataRequest),
    AddActuator(AddActuator),
    AddSensor(AddSensor),
    ActuatorCommand(ActuatorCommand),
    Information(Information),
    SensorData(SensorData),
    ActuatorData(ActuatorData),
    GreenhouseListData(GreenhouseListData),
    Error(ErrorReply),
}

impl Command {
    /// The envelope `messageType` this payload travels under.
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::GetAllGreenhouses => MessageType::GetAllGreenhouses,
            Self::CreateGreenhouse(_) => MessageType::CreateGreenhouse,
            Self::RemoveGreenhouse(_) => MessageType::RemoveGreenhouse,
            Self::DataRequest(_) => MessageType::DataRequest,
            Self::AddActuator(_) => MessageType::AddActuator,
            Self::AddSensor(_) => MessageType::AddSensor,
            Self::ActuatorCommand(_) => MessageType::ActuatorCommand,
            Self::Information(_) => MessageType::Information,
            Self::SensorData(_) => MessageType::SensorData,
            Self::ActuatorData(_) => MessageType::ActuatorData,
            Self::GreenhouseListData(_) => MessageType::GreenhouseListData,
            Self::Error(_) => MessageType::Error,
        }
    }

    /// Shorthand for an [`Information`] payload.
    #[must_use]
    pub fn information(text: impl Into<String>) -> Self {
        Self::Information(Information {
            information: text.into(),
        })
    }

    /// Shorthand for an [`ErrorReply`] payload.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self::Error(ErrorReply { error: text.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGreenhouse {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveGreenhouse {
    pub id: GreenhouseId,
}

/// Which devices a [`DataRequest`] targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceSelector {
    All,
    One(DeviceId),
}

impl From<String> for DeviceSelector {
    fn from(value: String) -> Self {
        if value == ALL_DEVICES {
            Self::All
        } else {
            Self::One(DeviceId::from(value))
        }
    }
}

impl From<DeviceSelector> for String {
    fn from(value: DeviceSelector) -> Self {
        match value {
            DeviceSelector::All => ALL_DEVICES.to_string(),
            DeviceSelector::One(id) => id.to_string(),
        }
    }
}

/// Device family named by a [`DataRequest`]'s `deviceType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Sensor,
    Actuator,
}

impl DeviceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sensor => "SENSOR",
            Self::Actuator => "ACTUATOR",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SENSOR" => Ok(Self::Sensor),
            "ACTUATOR" => Ok(Self::Actuator),
            other => Err(other.to_string()),
        }
    }
}

/// Ask for sensor readings or actuator states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRequest {
    #[serde(rename = "greenhouseID", alias = "greenhouseId")]
    pub greenhouse_id: GreenhouseId,
    #[serde(rename = "deviceID", alias = "deviceId")]
    pub device: DeviceSelector,
    /// `"SENSOR"` or `"ACTUATOR"`; validated by the dispatcher.
    #[serde(rename = "deviceType")]
    pub device_type: String,
}

impl DataRequest {
    #[must_use]
    pub fn new(greenhouse_id: GreenhouseId, device: DeviceSelector, kind: DeviceKind) -> Self {
        Self {
            greenhouse_id,
            device,
            device_type: kind.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddActuator {
    pub greenhouse_id: GreenhouseId,
    pub actuator_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSensor {
    pub greenhouse_id: GreenhouseId,
    pub sensor_type: String,
}

/// What an [`ActuatorCommand`] asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorAction {
    SetPower(u32),
    SetState(bool),
}

/// Change an actuator's power or on/off state.
///
/// When both fields are given, `power` wins. A negative `power` counts as
/// absent, which is how older control panels leave it unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActuatorCommand {
    pub greenhouse_id: GreenhouseId,
    pub actuator_id: DeviceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_on: Option<bool>,
}

impl ActuatorCommand {
    #[must_use]
    pub fn set_power(greenhouse_id: GreenhouseId, actuator_id: DeviceId, power: u32) -> Self {
        Self {
            greenhouse_id,
            actuator_id,
            power: Some(i64::from(power)),
            turn_on: None,
        }
    }

    #[must_use]
    pub fn set_state(greenhouse_id: GreenhouseId, actuator_id: DeviceId, on: bool) -> Self {
        Self {
            greenhouse_id,
            actuator_id,
            power: None,
            turn_on: Some(on),
        }
    }

    /// Resolve the requested action, if any.
    #[must_use]
    pub fn action(&self) -> Option<ActuatorAction> {
        match (self.power.filter(|p| *p >= 0), self.turn_on) {
            (Some(power), _) => Some(ActuatorAction::SetPower(
                u32::try_from(power).unwrap_or(u32::MAX),
            )),
            (None, Some(on)) => Some(ActuatorAction::SetState(on)),
            (None, None) => None,
        }
    }
}

/// Free-text acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Information {
    pub information: String,
}

/// Free-text failure description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: String,
}

/// Sensor readings: one sensor, or every sensor of a greenhouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensorData {
    Single {
        #[serde(rename = "sensorID")]
        sensor_id: DeviceId,
        data: f64,
        unit: String,
    },
    All {
        sensors: BTreeMap<DeviceId, SensorReading>,
    },
}

/// Actuator states: one actuator, or every actuator of a greenhouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActuatorData {
    Single {
        #[serde(rename = "actuatorID")]
        actuator_id: DeviceId,
        #[serde(rename = "isOn")]
        is_on: bool,
        power: u32,
    },
    All {
        actuators: BTreeMap<DeviceId, ActuatorStatus>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreenhouseListData {
    pub greenhouses: Vec<GreenhouseSummary>,
}
