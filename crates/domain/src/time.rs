//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Milliseconds since the Unix epoch, as carried in message envelopes.
#[must_use]
pub fn now_millis() -> i64 {
    now().timestamp_millis()
}
