use chrono::{DateTime, Utc};
use parley_engine::{Conversation, EventStream, MessageSink};

/// Explicit session lifecycle.
///
/// A session spends its life in `Active`; `Closing` and `Closed` exist only
/// inside the registry's close path, which runs under the registry lock so
/// a close racing a send is serialized per-session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Registered and accepting messages.
    Active,
    /// Close decided; the sink is being shut down.
    Closing,
    /// The underlying conversation has been closed.
    Closed,
}

/// One user's live conversation plus relay bookkeeping.
#[derive(Debug)]
pub struct Session {
    key: String,
    user_id: String,
    created_at: DateTime<Utc>,
    lifecycle: Lifecycle,
    sink: MessageSink,
    /// Present until the stream endpoint takes it; exactly one reader.
    events: Option<EventStream>,
}

impl Session {
    /// Wrap a freshly started conversation.
    pub fn new(key: impl Into<String>, user_id: impl Into<String>, conv: Conversation) -> Self {
        Self {
            key: key.into(),
            user_id: user_id.into(),
            created_at: Utc::now(),
            lifecycle: Lifecycle::Active,
            sink: conv.sink,
            events: Some(conv.events),
        }
    }

    /// The opaque session key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The user this session belongs to.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// When the session was registered.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// The outbound sink. Callers must hold the registry lock and check
    /// [`lifecycle`](Self::lifecycle) first.
    pub(crate) fn sink(&self) -> &MessageSink {
        &self.sink
    }

    /// Take the inbound event stream. `None` if a reader already has it.
    pub(crate) fn take_events(&mut self) -> Option<EventStream> {
        self.events.take()
    }

    /// Close the underlying conversation. Idempotent; returns `true` only
    /// for the call that performed the close.
    pub(crate) fn close(&mut self) -> bool {
        if self.lifecycle != Lifecycle::Active {
            return false;
        }
        self.lifecycle = Lifecycle::Closing;
        let did_close = self.sink.close();
        self.lifecycle = Lifecycle::Closed;
        did_close
    }
}
