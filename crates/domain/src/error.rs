//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`GreenhubError`] via `#[from]` when crossing a port boundary.

/// Base error for domain operations.
#[derive(Debug, thiserror::Error)]
pub enum GreenhubError {
    /// A greenhouse, actuator, or sensor lookup failed.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// An actuator or sensor type string did not name a known variant.
    #[error(transparent)]
    InvalidDeviceType(#[from] InvalidDeviceTypeError),

    /// Every greenhouse id has been handed out once.
    #[error("no greenhouse ids left")]
    IdsExhausted,
}

/// Lookup of an object by id found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} with id {id} not found")]
pub struct NotFoundError {
    /// Kind of object that was looked up (`"Greenhouse"`, `"Actuator"`, `"Sensor"`).
    pub entity: &'static str,
    /// The id that was requested, rendered as text.
    pub id: String,
}

/// A device type string could not be turned into a concrete device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{family} type not found: {value}")]
pub struct InvalidDeviceTypeError {
    /// Device family (`"Actuator"` or `"Sensor"`).
    pub family: &'static str,
    /// The rejected type string.
    pub value: String,
}

impl GreenhubError {
    /// Whether this error is a not-found condition.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
