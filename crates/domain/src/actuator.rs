//! Actuators: devices that push one greenhouse attribute while switched on.
//!
//! Every actuator remembers the exact delta it last pushed into the
//! greenhouse (`applied_effect`). Switching off subtracts that stored delta
//! rather than recomputing it from `power`, so a `turn_on` … `turn_off` pair
//! always restores the attribute it touched, whatever `set_power` calls
//! happened in between.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InvalidDeviceTypeError;
use crate::greenhouse::Greenhouse;
use crate::id::DeviceId;

/// Greenhouse attribute an actuator acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Temperature,
    Humidity,
    Light,
}

impl Attribute {
    /// Push `delta` into `greenhouse`, returning what was actually applied.
    fn apply(self, greenhouse: &mut Greenhouse, delta: i32) -> i32 {
        match self {
            Self::Temperature => greenhouse.change_temperature(delta),
            Self::Humidity => greenhouse.change_humidity(delta),
            Self::Light => greenhouse.change_light(delta),
        }
    }
}

/// The closed set of actuator variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActuatorKind {
    Fan,
    Heater,
    Light,
    Sprinkler,
}

impl ActuatorKind {
    /// All variants, in declaration order.
    pub const ALL: [Self; 4] = [Self::Fan, Self::Heater, Self::Light, Self::Sprinkler];

    /// Type name used as the id prefix and on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fan => "Fan",
            Self::Heater => "Heater",
            Self::Light => "Light",
            Self::Sprinkler => "Sprinkler",
        }
    }

    /// The greenhouse attribute this variant controls.
    #[must_use]
    pub fn attribute(self) -> Attribute {
        match self {
            Self::Fan | Self::Heater => Attribute::Temperature,
            Self::Light => Attribute::Light,
            Self::Sprinkler => Attribute::Humidity,
        }
    }

    /// Delta this variant pushes into its attribute at `power`.
    ///
    /// | Variant | Effect |
    /// |---|---|
    /// | Fan | `-(3 + 2·power)` °C |
    /// | Heater | `+(3 + 2·power)` °C |
    /// | Light | `+(500 + 300·power)` lux |
    /// | Sprinkler | `+(10 + 10·power)` % |
    ///
    /// Arithmetic saturates instead of overflowing for absurd power levels.
    #[must_use]
    pub fn effect(self, power: u32) -> i32 {
        let power = i32::try_from(power).unwrap_or(i32::MAX);
        let linear = |base: i32, step: i32| base.saturating_add(step.saturating_mul(power));
        match self {
            Self::Fan => linear(3, 2).saturating_neg(),
            Self::Heater => linear(3, 2),
            Self::Light => linear(500, 300),
            Self::Sprinkler => linear(10, 10),
        }
    }
}

impl fmt::Display for ActuatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActuatorKind {
    type Err = InvalidDeviceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| InvalidDeviceTypeError {
                family: "Actuator",
                value: s.to_string(),
            })
    }
}

/// A switchable device with a power level.
///
/// Created detached (empty id); a [`SensorNode`](crate::node::SensorNode)
/// assigns the id on insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actuator {
    id: DeviceId,
    kind: ActuatorKind,
    is_on: bool,
    power: u32,
    applied_effect: i32,
}

impl Actuator {
    /// Create an actuator that is off at power `0`.
    #[must_use]
    pub fn new(kind: ActuatorKind) -> Self {
        Self {
            id: DeviceId::from(""),
            kind,
            is_on: false,
            power: 0,
            applied_effect: 0,
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
    pub fn kind(&self) -> ActuatorKind {
        self.kind
    }

    #[must_use]
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    #[must_use]
    pub fn power(&self) -> u32 {
        self.power
    }

    /// The delta currently held in the greenhouse by this actuator.
    ///
    /// Always `0` while off.
    #[must_use]
    pub fn applied_effect(&self) -> i32 {
        self.applied_effect
    }

    /// Switch on and push the effect for the current power. No-op when on.
    pub fn turn_on(&mut self, greenhouse: &mut Greenhouse) {
        if self.is_on {
            return;
        }
        let effect = self.kind.effect(self.power);
        self.applied_effect = self.kind.attribute().apply(greenhouse, effect);
        self.is_on = true;
    }

    /// Switch off and withdraw the stored effect. No-op when off.
    pub fn turn_off(&mut self, greenhouse: &mut Greenhouse) {
        if !self.is_on {
            return;
        }
        self.kind
            .attribute()
            .apply(greenhouse, self.applied_effect.saturating_neg());
        self.applied_effect = 0;
        self.is_on = false;
    }

    /// Flip the on/off state, returning the new state.
    pub fn toggle(&mut self, greenhouse: &mut Greenhouse) -> bool {
        if self.is_on {
            self.turn_off(greenhouse);
        } else {
            self.turn_on(greenhouse);
        }
        self.is_on
    }

    /// Switch to the requested state.
    pub fn set_state(&mut self, on: bool, greenhouse: &mut Greenhouse) {
        if on {
            self.turn_on(greenhouse);
        } else {
            self.turn_off(greenhouse);
        }
    }

    /// Change the power level.
    ///
    /// While on, the greenhouse is moved by the difference between the new
    /// effect and the stored one. While off only the level is recorded; the
    /// effect materializes on the next [`turn_on`](Self::turn_on).
    pub fn set_power(&mut self, power: u32, greenhouse: &mut Greenhouse) {
        if self.is_on {
            let target = self.kind.effect(power);
            let delta = target.saturating_sub(self.applied_effect);
            let applied = self.kind.attribute().apply(greenhouse, delta);
            self.applied_effect = self.applied_effect.saturating_add(applied);
        }
        self.power = power;
    }

    /// Copy out the externally visible state.
    #[must_use]
    pub fn status(&self) -> ActuatorStatus {
        ActuatorStatus {
            is_on: self.is_on,
            power: self.power,
        }
    }
}

/// On/off state and power level of one actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActuatorStatus {
    pub is_on: bool,
    pub power: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::greenhouse::{DEFAULT_HUMIDITY, DEFAULT_LIGHT, DEFAULT_TEMPERATURE};
    use crate::id::GreenhouseId;

    fn greenhouse() -> Greenhouse {
        Greenhouse::new(GreenhouseId::new(1), "Test")
    }

    #[test]
    fn should_compute_effect_per_variant() {
        assert_eq!(ActuatorKind::Fan.effect(0), -3);
        assert_eq!(ActuatorKind::Fan.effect(2), -7);
        assert_eq!(ActuatorKind::Heater.effect(2), 7);
        assert_eq!(ActuatorKind::Light.effect(1), 800);
        assert_eq!(ActuatorKind::Sprinkler.effect(3), 40);
    }

    #[test]
    fn should_saturate_effect_for_huge_power() {
        assert_eq!(ActuatorKind::Heater.effect(u32::MAX), i32::MAX);
        assert_eq!(ActuatorKind::Fan.effect(u32::MAX), -i32::MAX);
    }

    #[test]
    fn should_parse_every_variant_from_its_name() {
        for kind in ActuatorKind::ALL {
            assert_eq!(kind.as_str().parse::<ActuatorKind>().unwrap(), kind);
        }
    }

    #[test]
    fn should_reject_unknown_type_string() {
        let err = "Toaster".parse::<ActuatorKind>().unwrap_err();
        assert_eq!(err.family, "Actuator");
        assert_eq!(err.value, "Toaster");
    }

    #[test]
    fn should_cool_greenhouse_when_fan_turns_on() {
        let mut gh = greenhouse();
        let mut fan = Actuator::new(ActuatorKind::Fan);
        fan.turn_on(&mut gh);
        assert!(fan.is_on());
        assert_eq!(gh.temperature(), DEFAULT_TEMPERATURE - 3.0);
        assert_eq!(fan.applied_effect(), -3);
    }

    #[test]
    fn should_ignore_turn_on_when_already_on() {
        let mut gh = greenhouse();
        let mut heater = Actuator::new(ActuatorKind::Heater);
        heater.turn_on(&mut gh);
        heater.turn_on(&mut gh);
        assert_eq!(gh.temperature(), DEFAULT_TEMPERATURE + 3.0);
    }

    #[test]
    fn should_ignore_turn_off_when_already_off() {
        let mut gh = greenhouse();
        let mut light = Actuator::new(ActuatorKind::Light);
        light.turn_off(&mut gh);
        assert_eq!(gh, greenhouse());
        assert!(!light.is_on());
    }

    #[test]
    fn should_restore_greenhouse_after_on_then_off() {
        for kind in ActuatorKind::ALL {
            let mut gh = greenhouse();
            let before = gh.clone();
            let mut actuator = Actuator::new(kind);
            actuator.set_power(2, &mut gh);
            actuator.turn_on(&mut gh);
            assert_ne!(gh, before, "{kind} should change the greenhouse");
            actuator.turn_off(&mut gh);
            assert_eq!(gh, before, "{kind} should leave no residue");
            assert_eq!(actuator.applied_effect(), 0);
        }
    }

    #[test]
    fn should_restore_greenhouse_when_power_changes_while_on() {
        let mut gh = greenhouse();
        let before = gh.clone();
        let mut light = Actuator::new(ActuatorKind::Light);
        light.turn_on(&mut gh);
        for power in [4, 1, 9, 0, 3] {
            light.set_power(power, &mut gh);
            assert_eq!(gh.light(), DEFAULT_LIGHT + ActuatorKind::Light.effect(power));
        }
        light.turn_off(&mut gh);
        assert_eq!(gh, before);
    }

    #[test]
    fn should_only_record_power_when_off() {
        let mut gh = greenhouse();
        let mut heater = Actuator::new(ActuatorKind::Heater);
        heater.set_power(5, &mut gh);
        assert_eq!(heater.power(), 5);
        assert_eq!(gh.temperature(), DEFAULT_TEMPERATURE);

        heater.turn_on(&mut gh);
        assert_eq!(gh.temperature(), DEFAULT_TEMPERATURE + 13.0);
    }

    #[test]
    fn should_undo_only_the_clamped_part_for_sprinkler() {
        let mut gh = greenhouse();
        gh.change_humidity(35);
        let mut sprinkler = Actuator::new(ActuatorKind::Sprinkler);
        sprinkler.turn_on(&mut gh);
        assert_eq!(gh.humidity(), 100);
        assert_eq!(sprinkler.applied_effect(), 5);

        sprinkler.turn_off(&mut gh);
        assert_eq!(gh.humidity(), DEFAULT_HUMIDITY + 35);
    }

    #[test]
    fn should_return_new_state_from_toggle() {
        let mut gh = greenhouse();
        let mut fan = Actuator::new(ActuatorKind::Fan);
        assert!(fan.toggle(&mut gh));
        assert!(!fan.toggle(&mut gh));
        assert_eq!(gh, greenhouse());
    }

    #[test]
    fn should_switch_to_requested_state() {
        let mut gh = greenhouse();
        let mut fan = Actuator::new(ActuatorKind::Fan);
        fan.set_state(true, &mut gh);
        fan.set_state(true, &mut gh);
        assert!(fan.is_on());
        assert_eq!(gh.temperature(), DEFAULT_TEMPERATURE - 3.0);
        fan.set_state(false, &mut gh);
        assert!(!fan.is_on());
        assert_eq!(gh.temperature(), DEFAULT_TEMPERATURE);
    }

    #[test]
    fn should_serialize_status_in_camel_case() {
        let status = ActuatorStatus {
            is_on: true,
            power: 2,
        };
        assert_eq!(
            serde_json::to_string(&status).unwrap(),
            r#"{"isOn":true,"power":2}"#
        );
    }
}
