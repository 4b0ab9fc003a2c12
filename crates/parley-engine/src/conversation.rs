use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parley_core::{RelayError, RelayResult};
use tokio::sync::mpsc;

use crate::raw::RawEvent;

/// The inbound half of a conversation: raw engine events, consumed by
/// exactly one reader. An `Err` item is a mid-stream engine failure; the
/// stream ends after the engine closes the conversation.
pub type EventStream = mpsc::Receiver<RelayResult<RawEvent>>;

/// What the relay can push down a conversation's outbound channel.
#[derive(Debug)]
pub enum SinkCommand {
    /// A user text message to forward to the engine.
    Text(String),
    /// Terminate the conversation.
    Close,
}

/// Write half of a conversation: a FIFO, unbounded sink of outbound
/// messages, shared by any number of producers.
///
/// Closing is idempotent: the first [`close`](Self::close) wins, every
/// later call is a no-op, and sends after close fail with
/// [`RelayError::ConversationClosed`] instead of reaching the engine.
#[derive(Debug, Clone)]
pub struct MessageSink {
    tx: mpsc::UnboundedSender<SinkCommand>,
    closed: Arc<AtomicBool>,
}

impl MessageSink {
    /// Create a sink and the receiver an engine worker consumes.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SinkCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                closed: Arc::new(AtomicBool::new(false)),
            },
            rx,
        )
    }

    /// Queue a text message for the engine. Does not wait for a reply.
    pub fn send_text(&self, text: impl Into<String>) -> RelayResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RelayError::ConversationClosed);
        }
        self.tx
            .send(SinkCommand::Text(text.into()))
            .map_err(|_| RelayError::ConversationClosed)
    }

    /// Close the conversation. Returns `true` if this call performed the
    /// close, `false` if it was already closed.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        // The worker may already be gone; that is fine, close remains done.
        let _ = self.tx.send(SinkCommand::Close);
        true
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// A live conversation with the agent engine: one event stream in, one
/// message sink out.
#[derive(Debug)]
pub struct Conversation {
    /// Inbound raw events. Taken by the session's single stream reader.
    pub events: EventStream,
    /// Outbound message sink.
    pub sink: MessageSink,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn close_is_idempotent() {
        let (sink, _rx) = MessageSink::channel();
        assert!(sink.close());
        assert!(!sink.close());
        assert!(sink.is_closed());
    }

    #[test]
    fn send_after_close_fails() {
        let (sink, _rx) = MessageSink::channel();
        sink.send_text("first").unwrap();
        sink.close();
        let err = sink.send_text("second").unwrap_err();
        assert!(matches!(err, RelayError::ConversationClosed));
    }

    #[tokio::test]
    async fn commands_arrive_in_order() {
        let (sink, mut rx) = MessageSink::channel();
        sink.send_text("a").unwrap();
        sink.send_text("b").unwrap();
        sink.close();

        assert!(matches!(rx.recv().await, Some(SinkCommand::Text(t)) if t == "a"));
        assert!(matches!(rx.recv().await, Some(SinkCommand::Text(t)) if t == "b"));
        assert!(matches!(rx.recv().await, Some(SinkCommand::Close)));
    }
}
