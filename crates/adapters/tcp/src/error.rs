//! TCP adapter error types.

use greenhub_app::protocol::CodecError;

/// Errors raised by the connection server and the control-panel client.
#[derive(Debug, thiserror::Error)]
pub enum TcpError {
    /// Socket read, write or bind failure.
    #[error("socket error")]
    Io(#[from] std::io::Error),

    /// The peer went away in the middle of a line or before replying.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// A line could not be encoded or decoded.
    #[error("codec error")]
    Codec(#[from] CodecError),

    /// The server answered with an `ERROR` reply.
    #[error("server replied with an error: {0}")]
    Remote(String),

    /// The server answered with a reply of the wrong kind.
    #[error("expected {expected} reply, got {actual}")]
    UnexpectedReply {
        expected: &'static str,
        actual: String,
    },

    /// The reply's `correlationID` does not name the request just sent.
    #[error("reply correlated with {actual:?}, expected {expected:?}")]
    UncorrelatedReply {
        expected: Option<String>,
        actual: Option<String>,
    },

    /// No line arrived within the configured idle timeout.
    #[error("connection idle for too long")]
    IdleTimeout,
}
