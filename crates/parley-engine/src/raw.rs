use serde::{Deserialize, Serialize};

/// One raw event from the agent engine, prior to translation.
///
/// The shape mirrors what the upstream runtime emits: optional content made
/// of parts, a `partial` flag on text chunks, and turn boundary flags. A
/// single event may in principle carry either or both boundary flags; the
/// relay passes them through as received.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawEvent {
    /// Renderable payload, if any. Events with no content are legal
    /// (boundary markers, engine housekeeping).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<RawContent>,
    /// Whether this is an incremental chunk with more to follow.
    #[serde(default)]
    pub partial: bool,
    /// The engine finished a request/response turn.
    #[serde(default)]
    pub turn_complete: bool,
    /// The turn was cut short.
    #[serde(default)]
    pub interrupted: bool,
}

/// The content payload of a [`RawEvent`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawContent {
    /// Ordered content parts. The relay only ever inspects the first.
    #[serde(default)]
    pub parts: Vec<RawPart>,
}

/// One part of an event's content: text, binary data, or (from a lenient
/// upstream) neither.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawPart {
    /// Plain text payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Non-text payload (audio, image, ...). The relay does not speak
    /// these; see the translator for how they are handled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<RawBlob>,
}

/// An opaque binary payload with its media type. Data is base64 as sent by
/// the engine; the relay never decodes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawBlob {
    /// Media type of the payload.
    pub mime_type: String,
    /// Base64-encoded bytes.
    pub data: String,
}

impl RawEvent {
    /// A text chunk event.
    pub fn text(text: impl Into<String>, partial: bool) -> Self {
        Self {
            content: Some(RawContent {
                parts: vec![RawPart {
                    text: Some(text.into()),
                    inline_data: None,
                }],
            }),
            partial,
            ..Self::default()
        }
    }

    /// A turn-completion boundary event.
    pub fn turn_complete() -> Self {
        Self {
            turn_complete: true,
            ..Self::default()
        }
    }

    /// An interruption boundary event.
    pub fn interrupted() -> Self {
        Self {
            interrupted: true,
            ..Self::default()
        }
    }

    /// The first content part, if the event has one.
    pub fn first_part(&self) -> Option<&RawPart> {
        self.content.as_ref().and_then(|c| c.parts.first())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_upstream_text_event() {
        let json = r#"{"content":{"parts":[{"text":"hel"}]},"partial":true}"#;
        let event: RawEvent = serde_json::from_str(json).unwrap();
        assert!(event.partial);
        assert!(!event.turn_complete);
        assert_eq!(event.first_part().unwrap().text.as_deref(), Some("hel"));
    }

    #[test]
    fn parses_boundary_event_without_content() {
        let json = r#"{"turn_complete":true}"#;
        let event: RawEvent = serde_json::from_str(json).unwrap();
        assert!(event.turn_complete);
        assert!(event.first_part().is_none());
    }

    #[test]
    fn parses_blob_part() {
        let json =
            r#"{"content":{"parts":[{"inline_data":{"mime_type":"audio/pcm","data":"AA=="}}]}}"#;
        let event: RawEvent = serde_json::from_str(json).unwrap();
        let part = event.first_part().unwrap();
        assert!(part.text.is_none());
        assert_eq!(part.inline_data.as_ref().unwrap().mime_type, "audio/pcm");
    }
}
