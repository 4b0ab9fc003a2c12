use async_trait::async_trait;
use parley_core::RelayResult;
use tokio::sync::mpsc;
use tracing::debug;

use crate::conversation::{Conversation, MessageSink, SinkCommand};
use crate::raw::RawEvent;
use crate::AgentEngine;

/// Capacity of a conversation's event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A deterministic in-process engine.
///
/// Every inbound text gets a reply of `"{reply_prefix}{text}"`, emitted as
/// partial chunks of `chunk_size` characters with the last chunk marked
/// non-partial, followed by a turn-complete event. No network, no state
/// across turns — exactly what tests and local dev need.
pub struct ScriptedEngine {
    reply_prefix: String,
    chunk_size: usize,
}

impl ScriptedEngine {
    /// Engine with the default reply template and chunking.
    pub fn new() -> Self {
        Self {
            reply_prefix: "You said: ".to_string(),
            chunk_size: 8,
        }
    }

    /// Override the reply prefix.
    pub fn with_reply_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reply_prefix = prefix.into();
        self
    }

    /// Override how many characters each partial chunk carries.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentEngine for ScriptedEngine {
    async fn start_conversation(&self, user_id: &str) -> RelayResult<Conversation> {
        let (sink, mut commands) = MessageSink::channel();
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let prefix = self.reply_prefix.clone();
        let chunk_size = self.chunk_size;
        let user = user_id.to_string();

        tokio::spawn(async move {
            while let Some(command) = commands.recv().await {
                match command {
                    SinkCommand::Text(text) => {
                        let reply = format!("{prefix}{text}");
                        let chunks: Vec<String> = reply
                            .chars()
                            .collect::<Vec<_>>()
                            .chunks(chunk_size)
                            .map(|c| c.iter().collect())
                            .collect();
                        let last = chunks.len().saturating_sub(1);
                        for (i, chunk) in chunks.into_iter().enumerate() {
                            let event = RawEvent::text(chunk, i != last);
                            if events_tx.send(Ok(event)).await.is_err() {
                                // Reader is gone; the conversation is over.
                                return;
                            }
                        }
                        if events_tx.send(Ok(RawEvent::turn_complete())).await.is_err() {
                            return;
                        }
                    }
                    SinkCommand::Close => break,
                }
            }
            debug!(user_id = %user, "scripted conversation closed");
            // events_tx drops here, ending the event stream.
        });

        Ok(Conversation {
            events: events_rx,
            sink,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    async fn collect_turn(events: &mut crate::EventStream) -> Vec<RawEvent> {
        let mut out = Vec::new();
        while let Some(event) = events.recv().await {
            let event = event.unwrap();
            let done = event.turn_complete;
            out.push(event);
            if done {
                break;
            }
        }
        out
    }

    #[tokio::test]
    async fn reply_chunks_reassemble_and_turn_completes() {
        let engine = ScriptedEngine::new().with_chunk_size(4);
        let mut conv = engine.start_conversation("u1").await.unwrap();

        conv.sink.send_text("hello").unwrap();
        let events = collect_turn(&mut conv.events).await;

        let (texts, boundaries): (Vec<_>, Vec<_>) =
            events.iter().partition(|e| e.content.is_some());
        assert_eq!(boundaries.len(), 1);
        assert!(boundaries[0].turn_complete);

        let joined: String = texts
            .iter()
            .filter_map(|e| e.first_part().and_then(|p| p.text.clone()))
            .collect();
        assert_eq!(joined, "You said: hello");

        // All chunks but the last are partial.
        let partials: Vec<bool> = texts.iter().map(|e| e.partial).collect();
        assert!(!partials.last().unwrap());
        assert!(partials[..partials.len() - 1].iter().all(|p| *p));
    }

    #[tokio::test]
    async fn close_ends_the_event_stream() {
        let engine = ScriptedEngine::new();
        let mut conv = engine.start_conversation("u1").await.unwrap();
        conv.sink.close();
        assert!(conv.events.recv().await.is_none());
    }

    #[tokio::test]
    async fn replies_arrive_in_send_order() {
        let engine = ScriptedEngine::new().with_chunk_size(64);
        let mut conv = engine.start_conversation("u1").await.unwrap();

        conv.sink.send_text("one").unwrap();
        conv.sink.send_text("two").unwrap();

        let first = collect_turn(&mut conv.events).await;
        let second = collect_turn(&mut conv.events).await;

        let text_of = |events: &[RawEvent]| -> String {
            events
                .iter()
                .filter_map(|e| e.first_part().and_then(|p| p.text.clone()))
                .collect()
        };
        assert_eq!(text_of(&first), "You said: one");
        assert_eq!(text_of(&second), "You said: two");
    }
}
