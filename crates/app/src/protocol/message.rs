//! The message envelope: routing metadata plus an optional typed payload.

use greenhub_domain::time::now_millis;

use super::{CodecError, Command, MessageType};

/// Endpoint label the server uses for itself.
pub const SERVER_ENDPOINT: &str = "Server";

/// One request or reply.
///
/// `message_type` is kept as the raw tag so that an unknown type survives
/// decoding and can be reported by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub message_type: String,
    pub message_id: Option<String>,
    /// On a reply, the `message_id` of the request it answers.
    pub correlation_id: Option<String>,
    /// Milliseconds since the Unix epoch, set by the sender.
    pub timestamp: Option<i64>,
    pub body: Option<Command>,
}

fn fresh_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Message {
    /// A new request from `source` to the server.
    #[must_use]
    pub fn request(source: impl Into<String>, body: Command) -> Self {
        Self {
            source: Some(source.into()),
            destination: Some(SERVER_ENDPOINT.to_string()),
            message_type: body.message_type().as_str().to_string(),
            message_id: Some(fresh_id()),
            correlation_id: None,
            timestamp: Some(now_millis()),
            body: Some(body),
        }
    }

    /// A message from the server that answers no particular request, such
    /// as the error sent back for a line that could not be decoded.
    #[must_use]
    pub fn from_server(body: Command) -> Self {
        Self {
            source: Some(SERVER_ENDPOINT.to_string()),
            destination: None,
            message_type: body.message_type().as_str().to_string(),
            message_id: Some(fresh_id()),
            correlation_id: None,
            timestamp: Some(now_millis()),
            body: Some(body),
        }
    }

    /// The server's reply to `request`.
    #[must_use]
    pub fn reply_to(request: &Self, body: Command) -> Self {
        Self {
            destination: request.source.clone(),
            correlation_id: request.message_id.clone(),
            ..Self::from_server(body)
        }
    }

    /// An `ERROR` reply to `request`.
    #[must_use]
    pub fn error_reply(request: &Self, error: impl Into<String>) -> Self {
        Self::reply_to(request, Command::error(error))
    }

    /// The parsed `messageType`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownMessageType`] when the tag is not in the
    /// lookup table.
    pub fn kind(&self) -> Result<MessageType, CodecError> {
        self.message_type.parse()
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.message_type == MessageType::Error.as_str()
    }
}
