//! Greenhouse registry: the shared, thread-safe set of greenhouses.
//!
//! ## Locking
//!
//! - The registry membership list has one lock, held for the duration of
//!   add/remove/list and id allocation.
//! - Each [`GreenhouseHandle`] has one lock for its [`SensorNode`] and one
//!   for its [`Greenhouse`] environment.
//! - Device operations take the node lock, then the environment lock, and
//!   hold both for the whole read-compute-apply sequence. Nothing takes them
//!   in the opposite order.
//!
//! Poisoned locks are recovered: every critical section either completes or
//! leaves the guarded data untouched.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use greenhub_domain::actuator::{Actuator, ActuatorKind, ActuatorStatus};
use greenhub_domain::error::{GreenhubError, NotFoundError};
use greenhub_domain::greenhouse::{Greenhouse, GreenhouseSummary};
use greenhub_domain::id::{DeviceId, GreenhouseId};
use greenhub_domain::node::SensorNode;
use greenhub_domain::sensor::{Sensor, SensorKind, SensorReading};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One registered greenhouse: its environment plus its device node.
///
/// Handles are shared via [`Arc`]. A handle obtained before the greenhouse
/// was removed keeps working on its own copy of the state, but the registry
/// no longer resolves its id.
#[derive(Debug)]
pub struct GreenhouseHandle {
    id: GreenhouseId,
    node: Mutex<SensorNode>,
    environment: Mutex<Greenhouse>,
}

impl GreenhouseHandle {
    fn new(id: GreenhouseId, name: String) -> Self {
        Self {
            id,
            node: Mutex::new(SensorNode::new()),
            environment: Mutex::new(Greenhouse::new(id, name)),
        }
    }

    #[must_use]
    pub fn id(&self) -> GreenhouseId {
        self.id
    }

    /// Run `f` with exclusive access to the node and the environment.
    ///
    /// This is the single critical section every device operation goes
    /// through.
    pub fn with_devices<R>(&self, f: impl FnOnce(&mut SensorNode, &mut Greenhouse) -> R) -> R {
        let mut node = lock(&self.node);
        let mut environment = lock(&self.environment);
        f(&mut node, &mut environment)
    }

    /// Copy of the current environment.
    #[must_use]
    pub fn summary(&self) -> GreenhouseSummary {
        lock(&self.environment).summary()
    }

    #[must_use]
    pub fn name(&self) -> String {
        lock(&self.environment).name().to_string()
    }

    pub fn rename(&self, name: impl Into<String>) {
        lock(&self.environment).set_name(name);
    }

    /// Install a new actuator of `kind` and return its id.
    #[tracing::instrument(skip(self), fields(greenhouse_id = %self.id))]
    pub fn add_actuator(&self, kind: ActuatorKind) -> DeviceId {
        let id = lock(&self.node).add_actuator(Actuator::new(kind));
        tracing::debug!(actuator_id = %id, "actuator added");
        id
    }

    /// Install a new sensor of `kind` and return its id.
    #[tracing::instrument(skip(self), fields(greenhouse_id = %self.id))]
    pub fn add_sensor(&self, kind: SensorKind) -> DeviceId {
        let id = lock(&self.node).add_sensor(Sensor::new(kind));
        tracing::debug!(sensor_id = %id, "sensor added");
        id
    }

    /// Switch an actuator off, then detach it.
    ///
    /// # Errors
    ///
    /// Returns [`GreenhubError::NotFound`] when the node has no such actuator.
    pub fn remove_actuator(&self, id: &DeviceId) -> Result<(), GreenhubError> {
        self.with_devices(|node, environment| -> Result<(), GreenhubError> {
            node.set_actuator_state(id, false, environment)?;
            node.remove_actuator(id);
            Ok(())
        })
    }

    /// Detach a sensor.
    ///
    /// # Errors
    ///
    /// Returns [`GreenhubError::NotFound`] when the node has no such sensor.
    pub fn remove_sensor(&self, id: &DeviceId) -> Result<(), GreenhubError> {
        lock(&self.node)
            .remove_sensor(id)
            .map(|_| ())
            .ok_or_else(|| {
                NotFoundError {
                    entity: "Sensor",
                    id: id.to_string(),
                }
                .into()
            })
    }

    /// Toggle an actuator, returning its new state.
    ///
    /// # Errors
    ///
    /// Returns [`GreenhubError::NotFound`] when the node has no such actuator.
    pub fn toggle_actuator(&self, id: &DeviceId) -> Result<bool, GreenhubError> {
        self.with_devices(|node, environment| node.toggle_actuator(id, environment))
    }

    /// Set an actuator's power level.
    ///
    /// # Errors
    ///
    /// Returns [`GreenhubError::NotFound`] when the node has no such actuator.
    pub fn set_actuator_power(&self, id: &DeviceId, power: u32) -> Result<(), GreenhubError> {
        self.with_devices(|node, environment| node.set_actuator_power(id, power, environment))
    }

    /// Switch an actuator on or off.
    ///
    /// # Errors
    ///
    /// Returns [`GreenhubError::NotFound`] when the node has no such actuator.
    pub fn set_actuator_state(&self, id: &DeviceId, on: bool) -> Result<(), GreenhubError> {
        self.with_devices(|node, environment| node.set_actuator_state(id, on, environment))
    }

    /// State of one actuator.
    ///
    /// # Errors
    ///
    /// Returns [`GreenhubError::NotFound`] when the node has no such actuator.
    pub fn actuator_status(&self, id: &DeviceId) -> Result<ActuatorStatus, GreenhubError> {
        lock(&self.node).actuator_status(id)
    }

    /// State of every actuator, taken under one lock.
    #[must_use]
    pub fn actuator_statuses(&self) -> BTreeMap<DeviceId, ActuatorStatus> {
        lock(&self.node)
            .actuators()
            .map(|actuator| (actuator.id().clone(), actuator.status()))
            .collect()
    }

    /// Read one sensor.
    ///
    /// # Errors
    ///
    /// Returns [`GreenhubError::NotFound`] when the node has no such sensor.
    pub fn read_sensor(&self, id: &DeviceId) -> Result<SensorReading, GreenhubError> {
        self.with_devices(|node, environment| node.read_sensor(id, environment))
    }

    /// Read every sensor against one consistent environment snapshot.
    #[must_use]
    pub fn read_sensors(&self) -> BTreeMap<DeviceId, SensorReading> {
        self.with_devices(|node, environment| {
            node.sensors()
                .map(|sensor| (sensor.id().clone(), sensor.reading(environment)))
                .collect()
        })
    }
}

#[derive(Debug, Default)]
struct Membership {
    last_id: u32,
    greenhouses: Vec<Arc<GreenhouseHandle>>,
}

/// The set of all greenhouses served by one process.
///
/// Constructed once at startup and shared (behind an [`Arc`]) with every
/// connection.
#[derive(Debug, Default)]
pub struct GreenhouseRegistry {
    membership: Mutex<Membership>,
}

impl GreenhouseRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a greenhouse with the default climate and return its id.
    ///
    /// Ids increase strictly and are never handed out twice, even after
    /// removals.
    ///
    /// # Errors
    ///
    /// Returns [`GreenhubError::IdsExhausted`] once `u32::MAX` has been used.
    #[tracing::instrument(skip(self, name), fields(name = %name.as_ref()))]
    pub fn add_greenhouse(&self, name: impl AsRef<str>) -> Result<GreenhouseId, GreenhubError> {
        let mut membership = lock(&self.membership);
        membership.last_id = membership
            .last_id
            .checked_add(1)
            .ok_or(GreenhubError::IdsExhausted)?;
        let id = GreenhouseId::new(membership.last_id);
        membership
            .greenhouses
            .push(Arc::new(GreenhouseHandle::new(id, name.as_ref().to_string())));
        tracing::info!(greenhouse_id = %id, "greenhouse registered");
        Ok(id)
    }

    /// Remove the greenhouse `id`. Returns whether anything was removed.
    #[tracing::instrument(skip(self))]
    pub fn remove_greenhouse(&self, id: GreenhouseId) -> bool {
        let mut membership = lock(&self.membership);
        let before = membership.greenhouses.len();
        membership.greenhouses.retain(|gh| gh.id() != id);
        let removed = membership.greenhouses.len() != before;
        if removed {
            tracing::info!("greenhouse removed");
        }
        removed
    }

    /// Look up a greenhouse.
    ///
    /// # Errors
    ///
    /// Returns [`GreenhubError::NotFound`] when no greenhouse has that id.
    pub fn get_greenhouse(&self, id: GreenhouseId) -> Result<Arc<GreenhouseHandle>, GreenhubError> {
        lock(&self.membership)
            .greenhouses
            .iter()
            .find(|gh| gh.id() == id)
            .cloned()
            .ok_or_else(|| {
                NotFoundError {
                    entity: "Greenhouse",
                    id: id.to_string(),
                }
                .into()
            })
    }

    /// Snapshot of the current membership, in registration order.
    #[must_use]
    pub fn all_greenhouses(&self) -> Vec<Arc<GreenhouseHandle>> {
        lock(&self.membership).greenhouses.clone()
    }

    /// Environment copies of every greenhouse, in registration order.
    #[must_use]
    pub fn summaries(&self) -> Vec<GreenhouseSummary> {
        self.all_greenhouses()
            .iter()
            .map(|gh| gh.summary())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.membership).greenhouses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenhub_domain::greenhouse::{DEFAULT_HUMIDITY, DEFAULT_LIGHT, DEFAULT_TEMPERATURE};

    #[test]
    fn should_assign_sequential_ids_starting_at_one() {
        let registry = GreenhouseRegistry::new();
        assert_eq!(registry.add_greenhouse("A").unwrap(), GreenhouseId::new(1));
        assert_eq!(registry.add_greenhouse("B").unwrap(), GreenhouseId::new(2));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn should_never_reuse_ids_after_removal() {
        let registry = GreenhouseRegistry::new();
        let first = registry.add_greenhouse("A").unwrap();
        let second = registry.add_greenhouse("B").unwrap();
        assert!(registry.remove_greenhouse(first));
        assert!(registry.remove_greenhouse(second));
        let third = registry.add_greenhouse("C").unwrap();
        assert_eq!(third, GreenhouseId::new(3));
    }

    #[test]
    fn should_fail_when_ids_are_exhausted() {
        let registry = GreenhouseRegistry::new();
        lock(&registry.membership).last_id = u32::MAX - 1;
        assert_eq!(
            registry.add_greenhouse("Last").unwrap(),
            GreenhouseId::new(u32::MAX)
        );
        assert!(matches!(
            registry.add_greenhouse("Overflow"),
            Err(GreenhubError::IdsExhausted)
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn should_report_whether_removal_happened() {
        let registry = GreenhouseRegistry::new();
        let id = registry.add_greenhouse("A").unwrap();
        assert!(registry.remove_greenhouse(id));
        assert!(!registry.remove_greenhouse(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn should_return_not_found_for_stale_id() {
        let registry = GreenhouseRegistry::new();
        let id = registry.add_greenhouse("A").unwrap();
        registry.remove_greenhouse(id);
        let err = registry.get_greenhouse(id).unwrap_err();
        assert_eq!(err.to_string(), "Greenhouse with id 1 not found");
    }

    #[test]
    fn should_return_snapshot_unaffected_by_later_changes() {
        let registry = GreenhouseRegistry::new();
        registry.add_greenhouse("A").unwrap();
        let snapshot = registry.all_greenhouses();
        registry.add_greenhouse("B").unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.all_greenhouses().len(), 2);
    }

    #[test]
    fn should_list_summaries_in_registration_order() {
        let registry = GreenhouseRegistry::new();
        registry.add_greenhouse("A").unwrap();
        registry.add_greenhouse("B").unwrap();
        let names: Vec<_> = registry.summaries().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn should_allocate_distinct_ids_under_concurrent_adds() {
        let registry = GreenhouseRegistry::new();
        std::thread::scope(|scope| {
            for t in 0..8 {
                let registry = &registry;
                scope.spawn(move || {
                    for i in 0..50 {
                        registry.add_greenhouse(format!("gh-{t}-{i}")).unwrap();
                    }
                });
            }
        });
        let mut ids: Vec<_> = registry.all_greenhouses().iter().map(|g| g.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 400);
        assert_eq!(ids.last().copied(), Some(GreenhouseId::new(400)));
    }

    #[test]
    fn should_leave_state_unchanged_after_even_concurrent_toggles() {
        let registry = GreenhouseRegistry::new();
        let gh = registry
            .get_greenhouse(registry.add_greenhouse("A").unwrap())
            .unwrap();
        let fan = gh.add_actuator(ActuatorKind::Fan);
        gh.set_actuator_power(&fan, 4).unwrap();
        let before = gh.summary();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let gh = &gh;
                let fan = &fan;
                scope.spawn(move || {
                    for _ in 0..250 {
                        gh.toggle_actuator(fan).unwrap();
                    }
                });
            }
        });

        assert!(!gh.actuator_status(&fan).unwrap().is_on);
        assert_eq!(gh.summary(), before);
    }

    #[test]
    fn should_leave_state_unchanged_after_concurrent_power_changes_and_switch_off() {
        let registry = GreenhouseRegistry::new();
        let gh = registry
            .get_greenhouse(registry.add_greenhouse("A").unwrap())
            .unwrap();
        let light = gh.add_actuator(ActuatorKind::Light);
        let before = gh.summary();
        gh.set_actuator_state(&light, true).unwrap();

        std::thread::scope(|scope| {
            for t in 0..4_u32 {
                let gh = &gh;
                let light = &light;
                scope.spawn(move || {
                    for p in 0..100 {
                        gh.set_actuator_power(light, (p + t) % 7).unwrap();
                    }
                });
            }
        });

        let power = gh.actuator_status(&light).unwrap().power;
        assert_eq!(
            gh.summary().light,
            DEFAULT_LIGHT + ActuatorKind::Light.effect(power)
        );
        gh.set_actuator_state(&light, false).unwrap();
        assert_eq!(gh.summary(), before);
    }

    #[test]
    fn should_read_all_sensors_against_same_environment() {
        let registry = GreenhouseRegistry::new();
        let gh = registry
            .get_greenhouse(registry.add_greenhouse("A").unwrap())
            .unwrap();
        gh.add_sensor(SensorKind::Temperature);
        gh.add_sensor(SensorKind::Humidity);
        gh.add_sensor(SensorKind::Light);

        let readings = gh.read_sensors();
        assert_eq!(readings.len(), 3);
        assert_eq!(readings[&DeviceId::from("Temperature-1")].value, DEFAULT_TEMPERATURE);
        assert_eq!(
            readings[&DeviceId::from("Humidity-1")].value,
            f64::from(DEFAULT_HUMIDITY)
        );
        assert_eq!(readings[&DeviceId::from("Light-1")].unit, "Lux");
    }

    #[test]
    fn should_withdraw_effect_when_removing_running_actuator() {
        let registry = GreenhouseRegistry::new();
        let gh = registry
            .get_greenhouse(registry.add_greenhouse("A").unwrap())
            .unwrap();
        let heater = gh.add_actuator(ActuatorKind::Heater);
        gh.set_actuator_state(&heater, true).unwrap();
        gh.remove_actuator(&heater).unwrap();
        assert_eq!(gh.summary().temperature, DEFAULT_TEMPERATURE);
        assert!(gh.actuator_statuses().is_empty());
    }

    #[test]
    fn should_report_not_found_when_removing_unknown_devices() {
        let registry = GreenhouseRegistry::new();
        let gh = registry
            .get_greenhouse(registry.add_greenhouse("A").unwrap())
            .unwrap();
        assert!(gh.remove_actuator(&DeviceId::from("Fan-1")).is_err());
        assert!(gh.remove_sensor(&DeviceId::from("Light-1")).is_err());
    }

    #[test]
    fn should_rename_greenhouse() {
        let registry = GreenhouseRegistry::new();
        let gh = registry
            .get_greenhouse(registry.add_greenhouse("A").unwrap())
            .unwrap();
        gh.rename("Renamed");
        assert_eq!(gh.name(), "Renamed");
        assert_eq!(registry.summaries()[0].name, "Renamed");
    }
}
