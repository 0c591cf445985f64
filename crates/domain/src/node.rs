//! Sensor node: the actuators and sensors installed in one greenhouse.
//!
//! ## Id allocation
//!
//! A device added to a node gets the id `<Type>-<N>` where `N` is found by
//! trying `1, 2, 3, …` until the id is free in that node's map. The scan
//! always restarts at `1`, so removing `Fan-2` from `{Fan-1, Fan-2, Fan-3}`
//! and adding another fan yields `Fan-2` again. Ids are unique per node
//! only.

use std::collections::HashMap;

use crate::actuator::{Actuator, ActuatorStatus};
use crate::error::{GreenhubError, NotFoundError};
use crate::greenhouse::Greenhouse;
use crate::id::DeviceId;
use crate::sensor::{Sensor, SensorReading};

/// Device registry for one greenhouse.
///
/// Every stored device's own id equals the key it is stored under.
#[derive(Debug, Clone, Default)]
pub struct SensorNode {
    actuators: HashMap<DeviceId, Actuator>,
    sensors: HashMap<DeviceId, Sensor>,
}

fn free_id<V>(map: &HashMap<DeviceId, V>, device_type: &str) -> DeviceId {
    (1..=u32::MAX)
        .map(|n| DeviceId::numbered(device_type, n))
        .find(|id| !map.contains_key(id))
        .unwrap_or_else(|| DeviceId::numbered(device_type, u32::MAX))
}

fn actuator_not_found(id: &DeviceId) -> GreenhubError {
    NotFoundError {
        entity: "Actuator",
        id: id.to_string(),
    }
    .into()
}

fn sensor_not_found(id: &DeviceId) -> GreenhubError {
    NotFoundError {
        entity: "Sensor",
        id: id.to_string(),
    }
    .into()
}

impl SensorNode {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `actuator` under a freshly allocated id and return that id.
    pub fn add_actuator(&mut self, mut actuator: Actuator) -> DeviceId {
        let id = free_id(&self.actuators, actuator.kind().as_str());
        actuator.set_id(id.clone());
        self.actuators.insert(id.clone(), actuator);
        id
    }

    /// Insert `sensor` under a freshly allocated id and return that id.
    pub fn add_sensor(&mut self, mut sensor: Sensor) -> DeviceId {
        let id = free_id(&self.sensors, sensor.kind().as_str());
        sensor.set_id(id.clone());
        self.sensors.insert(id.clone(), sensor);
        id
    }

    /// Detach an actuator. Absent ids are ignored.
    ///
    /// The actuator's effect stays in the greenhouse; switch it off first
    /// to withdraw it.
    pub fn remove_actuator(&mut self, id: &DeviceId) -> Option<Actuator> {
        self.actuators.remove(id)
    }

    /// Detach a sensor. Absent ids are ignored.
    pub fn remove_sensor(&mut self, id: &DeviceId) -> Option<Sensor> {
        self.sensors.remove(id)
    }

    #[must_use]
    pub fn actuator(&self, id: &DeviceId) -> Option<&Actuator> {
        self.actuators.get(id)
    }

    #[must_use]
    pub fn sensor(&self, id: &DeviceId) -> Option<&Sensor> {
        self.sensors.get(id)
    }

    pub fn actuators(&self) -> impl Iterator<Item = &Actuator> {
        self.actuators.values()
    }

    pub fn sensors(&self) -> impl Iterator<Item = &Sensor> {
        self.sensors.values()
    }

    #[must_use]
    pub fn actuator_count(&self) -> usize {
        self.actuators.len()
    }

    #[must_use]
    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    fn actuator_mut(&mut self, id: &DeviceId) -> Result<&mut Actuator, GreenhubError> {
        self.actuators
            .get_mut(id)
            .ok_or_else(|| actuator_not_found(id))
    }

    /// Toggle the actuator `id`, returning its new on/off state.
    ///
    /// # Errors
    ///
    /// Returns [`GreenhubError::NotFound`] when no actuator has that id.
    pub fn toggle_actuator(
        &mut self,
        id: &DeviceId,
        greenhouse: &mut Greenhouse,
    ) -> Result<bool, GreenhubError> {
        Ok(self.actuator_mut(id)?.toggle(greenhouse))
    }

    /// Set the power level of actuator `id`.
    ///
    /// # Errors
    ///
    /// Returns [`GreenhubError::NotFound`] when no actuator has that id.
    pub fn set_actuator_power(
        &mut self,
        id: &DeviceId,
        power: u32,
        greenhouse: &mut Greenhouse,
    ) -> Result<(), GreenhubError> {
        self.actuator_mut(id)?.set_power(power, greenhouse);
        Ok(())
    }

    /// Switch actuator `id` on or off.
    ///
    /// # Errors
    ///
    /// Returns [`GreenhubError::NotFound`] when no actuator has that id.
    pub fn set_actuator_state(
        &mut self,
        id: &DeviceId,
        on: bool,
        greenhouse: &mut Greenhouse,
    ) -> Result<(), GreenhubError> {
        self.actuator_mut(id)?.set_state(on, greenhouse);
        Ok(())
    }

    /// State of actuator `id`.
    ///
    /// # Errors
    ///
    /// Returns [`GreenhubError::NotFound`] when no actuator has that id.
    pub fn actuator_status(&self, id: &DeviceId) -> Result<ActuatorStatus, GreenhubError> {
        self.actuator(id)
            .map(Actuator::status)
            .ok_or_else(|| actuator_not_found(id))
    }

    /// Read sensor `id` against `greenhouse`.
    ///
    /// # Errors
    ///
    /// Returns [`GreenhubError::NotFound`] when no sensor has that id.
    pub fn read_sensor(
        &self,
        id: &DeviceId,
        greenhouse: &Greenhouse,
    ) -> Result<SensorReading, GreenhubError> {
        self.sensor(id)
            .map(|sensor| sensor.reading(greenhouse))
            .ok_or_else(|| sensor_not_found(id))
    }
}
