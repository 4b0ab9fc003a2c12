use std::collections::HashMap;

use parley_core::{RelayError, RelayResult};
use parley_engine::{Conversation, EventStream};
use tokio::sync::RwLock;
use tracing::info;

use crate::session::{Lifecycle, Session};

/// Process-wide mapping from session key to active [`Session`].
///
/// The registry is the only shared mutable structure in the relay. All
/// mutations go through its lock, which is held only across map operations
/// — never across engine or transport I/O — so `put`, `remove`, and the
/// send path are atomic with respect to each other. Two simultaneous
/// removals of the same key close the underlying conversation exactly once:
/// whichever caller takes the entry out of the map performs the close, the
/// other sees an absent key.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a freshly started conversation under `key`.
    ///
    /// Rejects duplicate keys with [`RelayError::Conflict`] rather than
    /// silently overwriting — an overwrite would orphan the previous
    /// session's conversation without ever closing it.
    pub async fn insert(
        &self,
        key: impl Into<String>,
        user_id: impl Into<String>,
        conv: Conversation,
    ) -> RelayResult<()> {
        let key = key.into();
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&key) {
            return Err(RelayError::Conflict(format!(
                "session already exists: {key}"
            )));
        }
        let session = Session::new(key.clone(), user_id, conv);
        sessions.insert(key.clone(), session);
        info!(session_key = %key, "session registered");
        Ok(())
    }

    /// Queue a text message on the session's outbound sink.
    ///
    /// Runs under the read lock, serializing against [`remove`](Self::remove):
    /// once a close has started, the entry is gone or no longer `Active`, so
    /// no write can reach a closed sink.
    pub async fn send_text(&self, key: &str, text: &str) -> RelayResult<()> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(key)
            .ok_or_else(|| RelayError::SessionNotFound(key.to_string()))?;
        if session.lifecycle() != Lifecycle::Active {
            return Err(RelayError::ConversationClosed);
        }
        session.sink().send_text(text)
    }

    /// Take the session's inbound event stream for the one stream reader.
    ///
    /// Fails with [`RelayError::SessionNotFound`] for absent keys and
    /// [`RelayError::Conflict`] if a reader is already attached.
    pub async fn take_events(&self, key: &str) -> RelayResult<EventStream> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(key)
            .ok_or_else(|| RelayError::SessionNotFound(key.to_string()))?;
        session.take_events().ok_or_else(|| {
            RelayError::Conflict(format!("stream already attached: {key}"))
        })
    }

    /// Remove the session and close its conversation.
    ///
    /// Returns the removed session, or `None` if the key was absent (e.g.
    /// an `end` racing a stream's own cleanup — the loser is a no-op).
    pub async fn remove(&self, key: &str) -> Option<Session> {
        let session = {
            let mut sessions = self.sessions.write().await;
            let mut session = sessions.remove(key)?;
            session.close();
            session
        };
        debug_assert_eq!(session.lifecycle(), Lifecycle::Closed);
        info!(session_key = %key, "session removed");
        Some(session)
    }

    /// Whether a session exists for `key`.
    pub async fn contains(&self, key: &str) -> bool {
        self.sessions.read().await.contains_key(key)
    }

    /// All current session keys, for diagnostics.
    pub async fn keys(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }

    /// Number of active sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the registry is empty.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
