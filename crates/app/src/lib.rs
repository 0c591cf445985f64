//! # greenhub-app
//!
//! Application layer: the shared registry, the wire protocol and the command
//! dispatcher.
//!
//! ## Responsibilities
//! - Own the **greenhouse registry** shared by every connection, and the
//!   locking that keeps device operations atomic
//! - Define the **message envelope** and the **command payloads**
//! - Provide the two-pass **line codec** (`encode` / `decode`)
//! - Provide the **command dispatcher** mapping one request to one reply
//!
//! ## Dependency rule
//! Depends on `greenhub-domain` only. Never touches sockets: the TCP adapter
//! feeds lines in and writes the reply lines out.

pub mod dispatcher;
pub mod protocol;
pub mod registry;
