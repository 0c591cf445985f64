//! Command dispatcher: turns one request into registry calls and a reply.
//!
//! The dispatcher holds no state of its own; everything lives in the shared
//! [`GreenhouseRegistry`]. Every failure becomes an `ERROR` reply, so a bad
//! request never ends the connection it arrived on.

use std::sync::Arc;

use greenhub_domain::actuator::ActuatorKind;
use greenhub_domain::error::{GreenhubError, NotFoundError};
use greenhub_domain::sensor::SensorKind;

use crate::protocol::command::{
    ActuatorAction, ActuatorCommand, ActuatorData, AddActuator, AddSensor, CreateGreenhouse,
    DataRequest, DeviceKind, DeviceSelector, GreenhouseListData, RemoveGreenhouse, SensorData,
};
use crate::protocol::message::SERVER_ENDPOINT;
use crate::protocol::{CodecError, Command, Message, MessageType, decode, encode};
use crate::registry::GreenhouseRegistry;

/// Why a request could not be served.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Domain(#[from] GreenhubError),

    /// No handler for this `messageType`.
    #[error("Message type not found: {0}")]
    UnknownCommandVariant(String),

    #[error("{0} request has no body")]
    MissingBody(MessageType),

    /// `deviceType` was neither `SENSOR` nor `ACTUATOR`.
    #[error("Device type not found: {0}")]
    UnknownDeviceKind(String),

    #[error("Actuator command needs either power or turnOn")]
    MissingActuatorAction,
}

/// Serves decoded requests against one registry.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    registry: Arc<GreenhouseRegistry>,
}

impl CommandHandler {
    #[must_use]
    pub fn new(registry: Arc<GreenhouseRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<GreenhouseRegistry> {
        &self.registry
    }

    /// Decode `line`, serve it and return the encoded reply.
    ///
    /// Always produces a reply line, even for input that is not an envelope.
    pub fn handle_line(&self, line: &str) -> String {
        tracing::debug!(%line, "request received");
        let reply = match decode(line) {
            Ok(request) => self.handle(&request),
            Err(err) => {
                let err = DispatchError::from(err);
                tracing::warn!(error = %err, "undecodable request");
                match &err {
                    DispatchError::Codec(CodecError::MalformedBody { request, .. }) => {
                        Message::error_reply(request, err.to_string())
                    }
                    _ => Message::from_server(Command::error(err.to_string())),
                }
            }
        };
        let encoded = encode(&reply).unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to encode reply");
            serde_json::json!({
                "source": SERVER_ENDPOINT,
                "messageType": MessageType::Error.as_str(),
                "body": { "error": err.to_string() },
            })
            .to_string()
        });
        tracing::debug!(reply = %encoded, "reply sent");
        encoded
    }

    /// Serve one decoded request.
    #[tracing::instrument(skip_all, fields(message_type = %request.message_type))]
    pub fn handle(&self, request: &Message) -> Message {
        match self.dispatch(request) {
            Ok(body) => Message::reply_to(request, body),
            Err(err) => {
                tracing::warn!(error = %err, "request failed");
                Message::error_reply(request, err.to_string())
            }
        }
    }

    /// Run the operation `request` asks for and return the reply payload.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] describing why the request was refused.
    pub fn dispatch(&self, request: &Message) -> Result<Command, DispatchError> {
        let kind = request
            .kind()
            .map_err(|_| DispatchError::UnknownCommandVariant(request.message_type.clone()))?;
        if kind == MessageType::GetAllGreenhouses {
            return Ok(self.list_greenhouses());
        }
        let body = request
            .body
            .as_ref()
            .ok_or(DispatchError::MissingBody(kind))?;

        match (kind, body) {
            (MessageType::CreateGreenhouse, Command::CreateGreenhouse(payload)) => {
                self.create_greenhouse(payload)
            }
            (MessageType::RemoveGreenhouse, Command::RemoveGreenhouse(payload)) => {
                self.remove_greenhouse(payload)
            }
            (MessageType::DataRequest, Command::DataRequest(payload)) => self.data_request(payload),
            (MessageType::AddActuator, Command::AddActuator(payload)) => self.add_actuator(payload),
            (MessageType::AddSensor, Command::AddSensor(payload)) => self.add_sensor(payload),
            (MessageType::ActuatorCommand, Command::ActuatorCommand(payload)) => {
                self.actuator_command(payload)
            }
            _ => Err(DispatchError::UnknownCommandVariant(
                request.message_type.clone(),
            )),
        }
    }

    fn list_greenhouses(&self) -> Command {
        Command::GreenhouseListData(GreenhouseListData {
            greenhouses: self.registry.summaries(),
        })
    }

    fn create_greenhouse(&self, payload: &CreateGreenhouse) -> Result<Command, DispatchError> {
        self.registry.add_greenhouse(&payload.name)?;
        Ok(Command::information(format!(
            "{} was added as a greenhouse.",
            payload.name
        )))
    }

    fn remove_greenhouse(&self, payload: &RemoveGreenhouse) -> Result<Command, DispatchError> {
        if !self.registry.remove_greenhouse(payload.id) {
            return Err(GreenhubError::from(NotFoundError {
                entity: "Greenhouse",
                id: payload.id.to_string(),
            })
            .into());
        }
        Ok(Command::information(format!(
            "Greenhouse with id: {} was removed.",
            payload.id
        )))
    }

    fn data_request(&self, payload: &DataRequest) -> Result<Command, DispatchError> {
        let kind: DeviceKind = payload
            .device_type
            .parse()
            .map_err(DispatchError::UnknownDeviceKind)?;
        let greenhouse = self.registry.get_greenhouse(payload.greenhouse_id)?;

        let reply = match (kind, &payload.device) {
            (DeviceKind::Sensor, DeviceSelector::All) => Command::SensorData(SensorData::All {
                sensors: greenhouse.read_sensors(),
            }),
            (DeviceKind::Sensor, DeviceSelector::One(id)) => {
                let reading = greenhouse.read_sensor(id)?;
                Command::SensorData(SensorData::Single {
                    sensor_id: id.clone(),
                    data: reading.value,
                    unit: reading.unit,
                })
            }
            (DeviceKind::Actuator, DeviceSelector::All) => {
                Command::ActuatorData(ActuatorData::All {
                    actuators: greenhouse.actuator_statuses(),
                })
            }
            (DeviceKind::Actuator, DeviceSelector::One(id)) => {
                let status = greenhouse.actuator_status(id)?;
                Command::ActuatorData(ActuatorData::Single {
                    actuator_id: id.clone(),
                    is_on: status.is_on,
                    power: status.power,
                })
            }
        };
        Ok(reply)
    }

    fn add_actuator(&self, payload: &AddActuator) -> Result<Command, DispatchError> {
        let kind: ActuatorKind = payload
            .actuator_type
            .parse()
            .map_err(GreenhubError::from)?;
        let greenhouse = self.registry.get_greenhouse(payload.greenhouse_id)?;
        let id = greenhouse.add_actuator(kind);
        Ok(Command::information(format!(
            "Actuator with id {id} was added to sensor node"
        )))
    }

    fn add_sensor(&self, payload: &AddSensor) -> Result<Command, DispatchError> {
        let kind: SensorKind = payload.sensor_type.parse().map_err(GreenhubError::from)?;
        let greenhouse = self.registry.get_greenhouse(payload.greenhouse_id)?;
        let id = greenhouse.add_sensor(kind);
        Ok(Command::information(format!(
            "Sensor with id {id} was added to sensor node"
        )))
    }

    fn actuator_command(&self, payload: &ActuatorCommand) -> Result<Command, DispatchError> {
        let action = payload
            .action()
            .ok_or(DispatchError::MissingActuatorAction)?;
        let greenhouse = self.registry.get_greenhouse(payload.greenhouse_id)?;
        match action {
            ActuatorAction::SetPower(power) => {
                greenhouse.set_actuator_power(&payload.actuator_id, power)?;
            }
            ActuatorAction::SetState(on) => {
                greenhouse.set_actuator_state(&payload.actuator_id, on)?;
            }
        }
        Ok(Command::information("Actuator state successfully changed"))
    }
}
