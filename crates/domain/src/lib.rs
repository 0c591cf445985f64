//! # greenhub-domain
//!
//! Pure domain model for the greenhub greenhouse simulator.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define the **Greenhouse** environment (temperature, humidity, light)
//! - Define **Actuators** (fan, heater, light, sprinkler) and their effects
//! - Define **Sensors** (temperature, humidity, light)
//! - Define the **Sensor node**: the per-greenhouse device registry and its
//!   id allocation rule
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or IO crates, and it
//! takes no locks: callers serialize access.

pub mod error;
pub mod id;
pub mod time;

pub mod actuator;
pub mod greenhouse;
pub mod node;
pub mod sensor;
