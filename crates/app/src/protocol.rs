//! Wire protocol: message envelope, command payloads and the line codec.
//!
//! A message is one JSON object per line. The envelope's `messageType`
//! names the payload variant; the payload itself carries no tag. Decoding
//! therefore runs in two passes, see [`codec::decode`].

pub mod codec;
pub mod command;
pub mod message;

use std::fmt;
use std::str::FromStr;

pub use codec::{decode, encode};
pub use command::Command;
pub use message::Message;

/// Codec failures.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The line is not a JSON envelope.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),

    /// The `body` does not match the shape `messageType` calls for.
    #[error("malformed {message_type} body: {source}")]
    MalformedBody {
        message_type: MessageType,
        /// The envelope that was read, without its body, so the error can
        /// still be answered.
        request: Box<Message>,
        #[source]
        source: serde_json::Error,
    },

    /// `messageType` has no entry in the lookup table.
    #[error("Message type not found: {0}")]
    UnknownMessageType(String),

    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Every `messageType` the protocol knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    GetAllGreenhouses,
    CreateGreenhouse,
    RemoveGreenhouse,
    DataRequest,
    AddActuator,
    AddSensor,
    ActuatorCommand,
    Information,
    SensorData,
    ActuatorData,
    GreenhouseListData,
    Error,
}

impl MessageType {
    pub const ALL: [Self; 12] = [
        Self::GetAllGreenhouses,
        Self::CreateGreenhouse,
        Self::RemoveGreenhouse,
        Self::DataRequest,
        Self::AddActuator,
        Self::AddSensor,
        Self::ActuatorCommand,
        Self::Information,
        Self::SensorData,
        Self::ActuatorData,
        Self::GreenhouseListData,
        Self::Error,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetAllGreenhouses => "GET_ALL_GREENHOUSES",
            Self::CreateGreenhouse => "CREATE_GREENHOUSE",
            Self::RemoveGreenhouse => "REMOVE_GREENHOUSE",
            Self::DataRequest => "DATA_REQUEST",
            Self::AddActuator => "ADD_ACTUATOR",
            Self::AddSensor => "ADD_SENSOR",
            Self::ActuatorCommand => "ACTUATOR_COMMAND",
            Self::Information => "INFORMATION",
            Self::SensorData => "SENSOR_DATA",
            Self::ActuatorData => "ACTUATOR_DATA",
            Self::GreenhouseListData => "GREENHOUSE_LIST_DATA",
            Self::Error => "ERROR",
        }
    }

    /// Whether a control panel sends this type (as opposed to the server).
    #[must_use]
    pub fn is_request(self) -> bool {
        matches!(
            self,
            Self::GetAllGreenhouses
                | Self::CreateGreenhouse
                | Self::RemoveGreenhouse
                | Self::DataRequest
                | Self::AddActuator
                | Self::AddSensor
                | Self::ActuatorCommand
        )
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CodecError::UnknownMessageType(s.to_string()))
    }
}
