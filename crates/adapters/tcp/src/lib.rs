//! # greenhub-adapter-tcp
//!
//! TCP adapter: serves the greenhub line protocol and provides the matching
//! control-panel client.
//!
//! ## Responsibilities
//! - Frame messages as one UTF-8 line each ([`protocol::Protocol`])
//! - Accept connections and run one task per connection ([`server::Server`])
//! - Hand every received line to the shared
//!   [`CommandHandler`](greenhub_app::dispatcher::CommandHandler) and write
//!   the reply back
//! - Honour the bare `EXIT` line: answer `Goodbye` and close
//! - Offer a typed client for control panels ([`client::ControlPanel`])
//!
//! ## Dependency rule
//! Depends on `greenhub-app` and `greenhub-domain`. Nothing in here knows
//! about greenhouse state beyond what the dispatcher returns.

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;

/// Bare line a client sends to end its session.
pub const EXIT_COMMAND: &str = "EXIT";

/// Bare line the server answers [`EXIT_COMMAND`] with.
pub const GOODBYE: &str = "Goodbye";
