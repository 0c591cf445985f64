//! Control-panel client.
//!
//! Wraps one connection and exposes a method per request type. Requests
//! are sent one at a time; each call waits for its reply.

use std::collections::BTreeMap;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};

use greenhub_app::protocol::command::{
    ActuatorCommand, ActuatorData, AddActuator, AddSensor, CreateGreenhouse, DataRequest,
    DeviceKind, DeviceSelector, RemoveGreenhouse, SensorData,
};
use greenhub_app::protocol::{Command, Message, MessageType, decode, encode};
use greenhub_domain::actuator::{ActuatorKind, ActuatorStatus};
use greenhub_domain::greenhouse::GreenhouseSummary;
use greenhub_domain::id::{DeviceId, GreenhouseId};
use greenhub_domain::sensor::{SensorKind, SensorReading};

use crate::error::TcpError;
use crate::protocol::Protocol;
use crate::{EXIT_COMMAND, GOODBYE};

/// Endpoint label the client puts in `source`.
pub const CLIENT_ENDPOINT: &str = "ControlPanel";

fn unexpected(expected: MessageType, reply: &Message) -> TcpError {
    TcpError::UnexpectedReply {
        expected: expected.as_str(),
        actual: reply.message_type.clone(),
    }
}

/// A connected control panel.
#[derive(Debug)]
pub struct ControlPanel<S = TcpStream> {
    protocol: Protocol<S>,
}

impl ControlPanel<TcpStream> {
    /// Open a connection to the server at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`TcpError::Io`] if the connection cannot be established.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, TcpError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }
}

impl<S: AsyncRead + AsyncWrite> ControlPanel<S> {
    pub fn new(stream: S) -> Self {
        Self {
            protocol: Protocol::new(stream),
        }
    }

    /// Send `body` as a request and wait for the reply.
    ///
    /// # Errors
    ///
    /// - [`TcpError::Remote`] if the server answers with an `ERROR` reply.
    /// - [`TcpError::UncorrelatedReply`] if the reply answers another request.
    /// - [`TcpError::ConnectionClosed`] if the server closes before replying.
    /// - [`TcpError::Io`] / [`TcpError::Codec`] on transport failures.
    pub async fn request(&mut self, body: Command) -> Result<Message, TcpError> {
        let request = Message::request(CLIENT_ENDPOINT, body);
        self.protocol.send_message(&encode(&request)?).await?;
        let line = self
            .protocol
            .read_message()
            .await?
            .ok_or(TcpError::ConnectionClosed)?;
        let reply = decode(&line)?;
        if reply.correlation_id != request.message_id {
            return Err(TcpError::UncorrelatedReply {
                expected: request.message_id,
                actual: reply.correlation_id,
            });
        }
        if let Some(Command::Error(err)) = &reply.body {
            return Err(TcpError::Remote(err.error.clone()));
        }
        Ok(reply)
    }

    async fn information(&mut self, body: Command) -> Result<String, TcpError> {
        let reply = self.request(body).await?;
        match reply.body {
            Some(Command::Information(info)) => Ok(info.information),
            _ => Err(unexpected(MessageType::Information, &reply)),
        }
    }

    async fn sensor_reply(
        &mut self,
        greenhouse_id: GreenhouseId,
        device: DeviceSelector,
    ) -> Result<SensorData, TcpError> {
        let reply = self
            .request(Command::DataRequest(DataRequest::new(
                greenhouse_id,
                device,
                DeviceKind::Sensor,
            )))
            .await?;
        match reply.body {
            Some(Command::SensorData(data)) => Ok(data),
            _ => Err(unexpected(MessageType::SensorData, &reply)),
        }
    }

    async fn actuator_reply(
        &mut self,
        greenhouse_id: GreenhouseId,
        device: DeviceSelector,
    ) -> Result<ActuatorData, TcpError> {
        let reply = self
            .request(Command::DataRequest(DataRequest::new(
                greenhouse_id,
                device,
                DeviceKind::Actuator,
            )))
            .await?;
        match reply.body {
            Some(Command::ActuatorData(data)) => Ok(data),
            _ => Err(unexpected(MessageType::ActuatorData, &reply)),
        }
    }

    /// # Errors
    ///
    /// See [`ControlPanel::request`].
    pub async fn get_all_greenhouses(&mut self) -> Result<Vec<GreenhouseSummary>, TcpError> {
        let reply = self.request(Command::GetAllGreenhouses).await?;
        match reply.body {
            Some(Command::GreenhouseListData(list)) => Ok(list.greenhouses),
            _ => Err(unexpected(MessageType::GreenhouseListData, &reply)),
        }
    }

    /// # Errors
    ///
    /// See [`ControlPanel::request`].
    pub async fn create_greenhouse(&mut self, name: impl Into<String>) -> Result<String, TcpError> {
        self.information(Command::CreateGreenhouse(CreateGreenhouse { name: name.into() }))
            .await
    }

    /// # Errors
    ///
    /// See [`ControlPanel::request`].
    pub async fn remove_greenhouse(&mut self, id: GreenhouseId) -> Result<String, TcpError> {
        self.information(Command::RemoveGreenhouse(RemoveGreenhouse { id }))
            .await
    }

    /// Read one sensor.
    ///
    /// # Errors
    ///
    /// See [`ControlPanel::request`].
    pub async fn sensor_data(
        &mut self,
        greenhouse_id: GreenhouseId,
        sensor_id: DeviceId,
    ) -> Result<SensorReading, TcpError> {
        match self
            .sensor_reply(greenhouse_id, DeviceSelector::One(sensor_id))
            .await?
        {
            SensorData::Single { data, unit, .. } => Ok(SensorReading { value: data, unit }),
            SensorData::All { .. } => Err(TcpError::UnexpectedReply {
                expected: "single sensor",
                actual: "all sensors".to_string(),
            }),
        }
    }

    /// Read every sensor of a greenhouse.
    ///
    /// # Errors
    ///
    /// See [`ControlPanel::request`].
    pub async fn all_sensor_data(
        &mut self,
        greenhouse_id: GreenhouseId,
    ) -> Result<BTreeMap<DeviceId, SensorReading>, TcpError> {
        match self.sensor_reply(greenhouse_id, DeviceSelector::All).await? {
            SensorData::All { sensors } => Ok(sensors),
            SensorData::Single { .. } => Err(TcpError::UnexpectedReply {
                expected: "all sensors",
                actual: "single sensor".to_string(),
            }),
        }
    }

    /// State of one actuator.
    ///
    /// # Errors
    ///
    /// See [`ControlPanel::request`].
    pub async fn actuator_data(
        &mut self,
        greenhouse_id: GreenhouseId,
        actuator_id: DeviceId,
    ) -> Result<ActuatorStatus, TcpError> {
        match self
            .actuator_reply(greenhouse_id, DeviceSelector::One(actuator_id))
            .await?
        {
            ActuatorData::Single { is_on, power, .. } => Ok(ActuatorStatus { is_on, power }),
            ActuatorData::All { .. } => Err(TcpError::UnexpectedReply {
                expected: "single actuator",
                actual: "all actuators".to_string(),
            }),
        }
    }

    /// State of every actuator of a greenhouse.
    ///
    /// # Errors
    ///
    /// See [`ControlPanel::request`].
    pub async fn all_actuator_data(
        &mut self,
        greenhouse_id: GreenhouseId,
    ) -> Result<BTreeMap<DeviceId, ActuatorStatus>, TcpError> {
        match self.actuator_reply(greenhouse_id, DeviceSelector::All).await? {
            ActuatorData::All { actuators } => Ok(actuators),
            ActuatorData::Single { .. } => Err(TcpError::UnexpectedReply {
                expected: "all actuators",
                actual: "single actuator".to_string(),
            }),
        }
    }

    /// # Errors
    ///
    /// See [`ControlPanel::request`].
    pub async fn add_actuator(
        &mut self,
        greenhouse_id: GreenhouseId,
        kind: ActuatorKind,
    ) -> Result<String, TcpError> {
        self.information(Command::AddActuator(AddActuator {
            greenhouse_id,
            actuator_type: kind.as_str().to_string(),
        }))
        .await
    }

    /// # Errors
    ///
    /// See [`ControlPanel::request`].
    pub async fn add_sensor(
        &mut self,
        greenhouse_id: GreenhouseId,
        kind: SensorKind,
    ) -> Result<String, TcpError> {
        self.information(Command::AddSensor(AddSensor {
            greenhouse_id,
            sensor_type: kind.as_str().to_string(),
        }))
        .await
    }

    /// # Errors
    ///
    /// See [`ControlPanel::request`].
    pub async fn set_actuator_power(
        &mut self,
        greenhouse_id: GreenhouseId,
        actuator_id: DeviceId,
        power: u32,
    ) -> Result<String, TcpError> {
        self.information(Command::ActuatorCommand(ActuatorCommand::set_power(
            greenhouse_id,
            actuator_id,
            power,
        )))
        .await
    }

    /// # Errors
    ///
    /// See [`ControlPanel::request`].
    pub async fn set_actuator_state(
        &mut self,
        greenhouse_id: GreenhouseId,
        actuator_id: DeviceId,
        on: bool,
    ) -> Result<String, TcpError> {
        self.information(Command::ActuatorCommand(ActuatorCommand::set_state(
            greenhouse_id,
            actuator_id,
            on,
        )))
        .await
    }

    /// Send `EXIT`, wait for `Goodbye` and close the connection.
    ///
    /// # Errors
    ///
    /// Returns [`TcpError::UnexpectedReply`] if the server answers anything
    /// other than `Goodbye`, plus the usual transport errors.
    pub async fn disconnect(mut self) -> Result<(), TcpError> {
        self.protocol.send_message(EXIT_COMMAND).await?;
        let reply = self
            .protocol
            .read_message()
            .await?
            .ok_or(TcpError::ConnectionClosed)?;
        if reply != GOODBYE {
            return Err(TcpError::UnexpectedReply {
                expected: GOODBYE,
                actual: reply,
            });
        }
        self.protocol.close().await
    }
}
