//! Line codec for [`Message`].
//!
//! The envelope is flat; `body` is nested and untagged. Decoding parses the
//! envelope with the body kept as raw JSON, then re-reads the body as the
//! payload `messageType` selects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::command::Command;
use super::{CodecError, Message, MessageType};

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    destination: Option<String>,
    #[serde(rename = "messageType")]
    message_type: String,
    #[serde(rename = "messageID", default, skip_serializing_if = "Option::is_none")]
    message_id: Option<String>,
    #[serde(rename = "correlationID", default, skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<Value>,
}

fn body_to_value(body: &Command) -> Result<Option<Value>, serde_json::Error> {
    let value = match body {
        Command::GetAllGreenhouses => return Ok(None),
        Command::CreateGreenhouse(payload) => serde_json::to_value(payload),
        Command::RemoveGreenhouse(payload) => serde_json::to_value(payload),
        Command::DataRequest(payload) => serde_json::to_value(payload),
        Command::AddActuator(payload) => serde_json::to_value(payload),
        Command::AddSensor(payload) => serde_json::to_value(payload),
        Command::ActuatorCommand(payload) => serde_json::to_value(payload),
        Command::Information(payload) => serde_json::to_value(payload),
        Command::SensorData(payload) => serde_json::to_value(payload),
        Command::ActuatorData(payload) => serde_json::to_value(payload),
        Command::GreenhouseListData(payload) => serde_json::to_value(payload),
        Command::Error(payload) => serde_json::to_value(payload),
    };
    value.map(Some)
}

fn value_to_body(message_type: MessageType, value: Value) -> Result<Command, serde_json::Error> {
    Ok(match message_type {
        MessageType::GetAllGreenhouses => Command::GetAllGreenhouses,
        MessageType::CreateGreenhouse => Command::CreateGreenhouse(serde_json::from_value(value)?),
        MessageType::RemoveGreenhouse => Command::RemoveGreenhouse(serde_json::from_value(value)?),
        MessageType::DataRequest => Command::DataRequest(serde_json::from_value(value)?),
        MessageType::AddActuator => Command::AddActuator(serde_json::from_value(value)?),
        MessageType::AddSensor => Command::AddSensor(serde_json::from_value(value)?),
        MessageType::ActuatorCommand => Command::ActuatorCommand(serde_json::from_value(value)?),
        MessageType::Information => Command::Information(serde_json::from_value(value)?),
        MessageType::SensorData => Command::SensorData(serde_json::from_value(value)?),
        MessageType::ActuatorData => Command::ActuatorData(serde_json::from_value(value)?),
        MessageType::GreenhouseListData => {
            Command::GreenhouseListData(serde_json::from_value(value)?)
        }
        MessageType::Error => Command::Error(serde_json::from_value(value)?),
    })
}

/// Render `message` as one line of JSON, without the trailing newline.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if the payload cannot be serialized.
pub fn encode(message: &Message) -> Result<String, CodecError> {
    let body = match &message.body {
        Some(body) => body_to_value(body).map_err(CodecError::Encode)?,
        None => None,
    };
    let envelope = Envelope {
        source: message.source.clone(),
        destination: message.destination.clone(),
        message_type: message.message_type.clone(),
        message_id: message.message_id.clone(),
        correlation_id: message.correlation_id.clone(),
        timestamp: message.timestamp,
        body,
    };
    serde_json::to_string(&envelope).map_err(CodecError::Encode)
}

/// Parse one line into a [`Message`].
///
/// An unknown `messageType` is not an error here: the message is returned
/// with no body so the dispatcher can answer it. `GET_ALL_GREENHOUSES`
/// needs no body and always decodes to [`Command::GetAllGreenhouses`].
///
/// # Errors
///
/// - [`CodecError::MalformedEnvelope`] if the line is not an envelope.
/// - [`CodecError::MalformedBody`] if the body does not fit its type. The
///   error keeps the rest of the envelope.
pub fn decode(line: &str) -> Result<Message, CodecError> {
    let envelope: Envelope = serde_json::from_str(line).map_err(CodecError::MalformedEnvelope)?;

    let mut message = Message {
        source: envelope.source,
        destination: envelope.destination,
        message_type: envelope.message_type,
        message_id: envelope.message_id,
        correlation_id: envelope.correlation_id,
        timestamp: envelope.timestamp,
        body: None,
    };

    let body = match (message.kind(), envelope.body) {
        (Ok(MessageType::GetAllGreenhouses), _) => Some(Command::GetAllGreenhouses),
        (Ok(message_type), Some(value)) => match value_to_body(message_type, value) {
            Ok(body) => Some(body),
            Err(source) => {
                return Err(CodecError::MalformedBody {
                    message_type,
                    request: Box::new(message),
                    source,
                });
            }
        },
        (Ok(_), None) => None,
        (Err(_), _) => {
            tracing::debug!(message_type = %message.message_type, "unknown message type, body left undecoded");
            None
        }
    };
    message.body = body;

    Ok(message)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use greenhub_domain::actuator::ActuatorStatus;
    use greenhub_domain::greenhouse::GreenhouseSummary;
    use greenhub_domain::id::{DeviceId, GreenhouseId};
    use greenhub_domain::sensor::SensorReading;

    use super::*;
    use crate::protocol::command::{
        ActuatorCommand, ActuatorData, AddActuator, AddSensor, CreateGreenhouse, DataRequest,
        DeviceKind, DeviceSelector, GreenhouseListData, RemoveGreenhouse, SensorData,
    };

    fn round_trip(body: Command) {
        let message = Message::request("ControlPanel", body);
        let decoded = decode(&encode(&message).unwrap()).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn should_round_trip_request_payloads() {
        let gh = GreenhouseId::new(3);
        round_trip(Command::GetAllGreenhouses);
        round_trip(Command::CreateGreenhouse(CreateGreenhouse {
            name: "North".to_string(),
        }));
        round_trip(Command::RemoveGreenhouse(RemoveGreenhouse { id: gh }));
        round_trip(Command::DataRequest(DataRequest::new(
            gh,
            DeviceSelector::All,
            DeviceKind::Sensor,
        )));
        round_trip(Command::AddActuator(AddActuator {
            greenhouse_id: gh,
            actuator_type: "Fan".to_string(),
        }));
        round_trip(Command::AddSensor(AddSensor {
            greenhouse_id: gh,
            sensor_type: "Light".to_string(),
        }));
        round_trip(Command::DataRequest(DataRequest::new(
            gh,
            DeviceSelector::One(DeviceId::from("Heater-2")),
            DeviceKind::Actuator,
        )));
        round_trip(Command::ActuatorCommand(ActuatorCommand::set_power(
            gh,
            DeviceId::from("Fan-1"),
            4,
        )));
        round_trip(Command::ActuatorCommand(ActuatorCommand::set_state(
            gh,
            DeviceId::from("Fan-1"),
            false,
        )));
    }

    #[test]
    fn should_round_trip_reply_payloads() {
        round_trip(Command::information("done"));
        round_trip(Command::error("nope"));
        round_trip(Command::SensorData(SensorData::All {
            sensors: BTreeMap::from([(
                DeviceId::from("Temperature-1"),
                SensorReading {
                    value: 14.1,
                    unit: "Celsius".to_string(),
                },
            )]),
        }));
        round_trip(Command::SensorData(SensorData::Single {
            sensor_id: DeviceId::from("Humidity-1"),
            data: 60.0,
            unit: "Percentage".to_string(),
        }));
        round_trip(Command::ActuatorData(ActuatorData::Single {
            actuator_id: DeviceId::from("Light-3"),
            is_on: false,
            power: 5,
        }));
        round_trip(Command::ActuatorData(ActuatorData::All {
            actuators: BTreeMap::from([(
                DeviceId::from("Fan-1"),
                ActuatorStatus {
                    is_on: true,
                    power: 2,
                },
            )]),
        }));
        round_trip(Command::GreenhouseListData(GreenhouseListData {
            greenhouses: vec![GreenhouseSummary {
                id: GreenhouseId::new(1),
                name: "A".to_string(),
                temperature: 14.0,
                humidity: 60,
                light: 1000,
            }],
        }));
    }

    #[test]
    fn should_omit_body_when_listing_greenhouses() {
        let message = Message::request("ControlPanel", Command::GetAllGreenhouses);
        let line = encode(&message).unwrap();
        assert!(!line.contains("\"body\""));
        assert!(line.contains("\"messageType\":\"GET_ALL_GREENHOUSES\""));
        assert!(line.contains("\"messageID\""));
    }

    #[test]
    fn should_decode_list_request_without_body() {
        let message = decode(r#"{"messageType":"GET_ALL_GREENHOUSES"}"#).unwrap();
        assert_eq!(message.body, Some(Command::GetAllGreenhouses));
        assert!(message.source.is_none());
    }

    #[test]
    fn should_encode_single_line() {
        let message = Message::request(
            "ControlPanel",
            Command::CreateGreenhouse(CreateGreenhouse {
                name: "multi\nline".to_string(),
            }),
        );
        assert!(!encode(&message).unwrap().contains('\n'));
    }

    #[test]
    fn should_leave_body_absent_when_message_type_is_unknown() {
        let message = decode(r#"{"messageType":"BOGUS","body":{"x":1}}"#).unwrap();
        assert_eq!(message.message_type, "BOGUS");
        assert!(message.body.is_none());
    }

    #[test]
    fn should_fail_with_malformed_envelope_when_line_is_not_json() {
        assert!(matches!(
            decode("hello there"),
            Err(CodecError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            decode(r#"{"source":"x"}"#),
            Err(CodecError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn should_fail_with_malformed_body_when_shape_mismatches() {
        let err = decode(
            r#"{"source":"CP","messageType":"REMOVE_GREENHOUSE","messageID":"m-9","body":{"id":"abc"}}"#,
        )
        .unwrap_err();
        let CodecError::MalformedBody {
            message_type,
            request,
            ..
        } = err
        else {
            panic!("expected malformed body, got {err:?}");
        };
        assert_eq!(message_type, MessageType::RemoveGreenhouse);
        assert_eq!(request.source.as_deref(), Some("CP"));
        assert_eq!(request.message_id.as_deref(), Some("m-9"));
        assert!(request.body.is_none());
    }

    #[test]
    fn should_decode_original_actuator_command_with_power_sentinel() {
        let message = decode(
            r#"{"messageType":"ACTUATOR_COMMAND","body":{"greenhouseId":1,"actuatorId":"Fan-1","power":-1,"turnOn":true}}"#,
        )
        .unwrap();
        let Some(Command::ActuatorCommand(command)) = message.body else {
            panic!("expected actuator command");
        };
        assert_eq!(
            command.action(),
            Some(crate::protocol::command::ActuatorAction::SetState(true))
        );
    }

    #[test]
    fn should_preserve_float_values_exactly() {
        let value = 0.1 + 0.2;
        let message = Message::request(
            "ControlPanel",
            Command::SensorData(SensorData::Single {
                sensor_id: DeviceId::from("Temperature-1"),
                data: value,
                unit: "Celsius".to_string(),
            }),
        );
        let decoded = decode(&encode(&message).unwrap()).unwrap();
        let Some(Command::SensorData(SensorData::Single { data, .. })) = decoded.body else {
            panic!("expected single sensor data");
        };
        assert_eq!(data.to_bits(), value.to_bits());
    }
}
