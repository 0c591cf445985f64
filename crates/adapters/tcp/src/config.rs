//! TCP listener configuration.

use std::time::Duration;

use serde::Deserialize;

/// Port the greenhouse server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 6767;

/// Configuration for the connection server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TcpConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Drop a connection after this many seconds without a line.
    /// Absent means connections may stay idle forever.
    pub idle_timeout_secs: Option<u64>,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            idle_timeout_secs: None,
        }
    }
}

impl TcpConfig {
    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }
}
