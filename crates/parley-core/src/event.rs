use serde::{Deserialize, Serialize};

/// The only inbound media type the relay accepts.
pub const TEXT_PLAIN: &str = "text/plain";

/// Normalized event pushed to a session's stream client.
///
/// This is the relay's own small protocol: whatever the agent engine emits
/// is translated into one of these three shapes before it reaches the
/// client. The JSON wire form is a compatibility surface — existing clients
/// parse these exact field names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayEvent {
    /// A chunk of agent-produced text. `partial` chunks may repeat before a
    /// final (non-partial) chunk for the same turn; the relay never buffers
    /// or concatenates — accumulation is a client-side concern.
    Text {
        /// Always `text/plain`; carried explicitly for client dispatch.
        mime_type: String,
        /// The text payload of this chunk.
        data: String,
        /// Whether more chunks follow for this logical piece of text.
        partial: bool,
    },

    /// A turn boundary. Both flags are passed through from the engine
    /// verbatim; a single event may in principle carry either or both.
    Control {
        /// The engine finished a request/response turn.
        turn_complete: bool,
        /// The turn was cut short (e.g. by a new inbound message).
        interrupted: bool,
    },

    /// A mid-stream failure. The client sees this frame, then the
    /// connection closes.
    Error {
        /// Human-readable description of what went wrong.
        message: String,
    },
}

impl RelayEvent {
    /// Shorthand for a text chunk event.
    pub fn text(data: impl Into<String>, partial: bool) -> Self {
        Self::Text {
            mime_type: TEXT_PLAIN.to_string(),
            data: data.into(),
            partial,
        }
    }

    /// Shorthand for an error event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// A client-to-agent message, as posted to the send endpoint.
///
/// The relay speaks text only — by restriction, not as a missing feature.
/// Any other `mime_type` is rejected at the boundary before it can reach a
/// session's outbound sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Declared media type of `data`. Must be `text/plain`.
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
    /// The message payload.
    #[serde(default)]
    pub data: String,
}

fn default_mime_type() -> String {
    TEXT_PLAIN.to_string()
}

impl InboundMessage {
    /// Returns the text payload if this is a text message, or the offending
    /// media type otherwise.
    pub fn into_text(self) -> Result<String, crate::RelayError> {
        if self.mime_type == TEXT_PLAIN {
            Ok(self.data)
        } else {
            Err(crate::RelayError::UnsupportedMediaType(self.mime_type))
        }
    }
}
