use parley_core::RelayEvent;
use parley_engine::RawEvent;
use tracing::warn;

/// Translate one raw engine event into the client-facing protocol.
///
/// Stateless per event:
///
/// - Turn boundary flags pass through verbatim; a single event may carry
///   either or both, and no repair is attempted.
/// - An event with no renderable payload yields `None` — that is normal
///   engine housekeeping, not an error.
/// - Text parts become [`RelayEvent::Text`] with the event's partial flag.
///   The translator never buffers or concatenates; accumulation is a
///   client-side concern.
/// - Non-text parts are logged and dropped: the relay speaks text only,
///   and an error frame here would tear down streams on upstream quirks.
pub fn translate(event: &RawEvent) -> Option<RelayEvent> {
    if event.turn_complete || event.interrupted {
        return Some(RelayEvent::Control {
            turn_complete: event.turn_complete,
            interrupted: event.interrupted,
        });
    }

    let part = event.first_part()?;
    if let Some(text) = &part.text {
        return Some(RelayEvent::text(text.clone(), event.partial));
    }

    if let Some(blob) = &part.inline_data {
        warn!(mime_type = %blob.mime_type, "dropping non-text engine event");
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use parley_engine::{RawBlob, RawContent, RawPart};

    #[test]
    fn boundary_flags_pass_through_verbatim() {
        let event = RawEvent {
            turn_complete: true,
            interrupted: true,
            ..RawEvent::default()
        };
        assert_eq!(
            translate(&event),
            Some(RelayEvent::Control {
                turn_complete: true,
                interrupted: true,
            })
        );

        assert_eq!(
            translate(&RawEvent::interrupted()),
            Some(RelayEvent::Control {
                turn_complete: false,
                interrupted: true,
            })
        );
    }

    #[test]
    fn empty_event_is_skipped() {
        assert_eq!(translate(&RawEvent::default()), None);

        let empty_parts = RawEvent {
            content: Some(RawContent { parts: vec![] }),
            ..RawEvent::default()
        };
        assert_eq!(translate(&empty_parts), None);
    }

    #[test]
    fn text_keeps_the_partial_flag() {
        assert_eq!(
            translate(&RawEvent::text("hel", true)),
            Some(RelayEvent::text("hel", true))
        );
        assert_eq!(
            translate(&RawEvent::text("hello", false)),
            Some(RelayEvent::text("hello", false))
        );
    }

    #[test]
    fn non_text_parts_are_dropped() {
        let event = RawEvent {
            content: Some(RawContent {
                parts: vec![RawPart {
                    text: None,
                    inline_data: Some(RawBlob {
                        mime_type: "audio/pcm".into(),
                        data: "AA==".into(),
                    }),
                }],
            }),
            ..RawEvent::default()
        };
        assert_eq!(translate(&event), None);
    }

    #[test]
    fn boundary_wins_over_content() {
        // A terminal event that also carries text is a boundary first;
        // the flags are what the client acts on.
        let mut event = RawEvent::text("tail", false);
        event.turn_complete = true;
        assert!(matches!(
            translate(&event),
            Some(RelayEvent::Control { turn_complete: true, .. })
        ));
    }
}
