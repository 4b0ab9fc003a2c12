use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use parley_core::{InboundMessage, RelayError, RelayEvent};
use parley_engine::EventStream;
use parley_session::SessionRegistry;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::respond;
use crate::server::AppState;
use crate::translate::translate;

/// SSE keep-alive interval, to stop proxies from closing idle streams.
const KEEP_ALIVE_SECS: u64 = 15;

/// POST /api/v1/chat/start-session
///
/// Mints a fresh session key, opens the underlying conversation, and
/// registers it. Repeated calls mint independent sessions — this is not a
/// no-op on retry. On engine failure nothing is registered.
pub async fn start_session(State(state): State<Arc<AppState>>) -> Response {
    let session_id = Uuid::new_v4().to_string();

    let conv = match state.engine.start_conversation(&session_id).await {
        Ok(conv) => conv,
        Err(e) => {
            error!(error = %e, "failed to start agent conversation");
            return respond::failure(&e);
        }
    };

    if let Err(e) = state.registry.insert(&session_id, &session_id, conv).await {
        // Freshly minted uuid collided (or a racing insert won): the
        // rejected conversation is dropped, which shuts its worker down.
        error!(error = %e, session_key = %session_id, "failed to register session");
        return respond::failure(&e);
    }

    info!(session_key = %session_id, "chat session started");
    respond::success(
        serde_json::json!({
            "session_id": session_id,
            "stream_url": format!("/api/v1/chat/stream/{session_id}"),
            "send_url": format!("/api/v1/chat/send/{session_id}"),
        }),
        "Chat session started successfully",
    )
}

/// GET /api/v1/chat/stream/{user_id}
///
/// The long-lived server-push half of a session. Joins the session if one
/// exists, creates one ad hoc otherwise (existing clients stream first).
/// Exactly one stream may attach per session. Cleanup — close the
/// conversation, drop the registry entry — runs exactly once whether the
/// stream ends normally, errors, or the client disconnects.
pub async fn stream(State(state): State<Arc<AppState>>, Path(user_id): Path<String>) -> Response {
    if !state.registry.contains(&user_id).await {
        let conv = match state.engine.start_conversation(&user_id).await {
            Ok(conv) => conv,
            Err(e) => {
                error!(error = %e, session_key = %user_id, "failed to start agent conversation");
                return respond::failure(&e);
            }
        };
        if let Err(e) = state.registry.insert(&user_id, &user_id, conv).await {
            // Lost a race with a concurrent starter; join the winner.
            warn!(session_key = %user_id, error = %e, "joining concurrently created session");
        }
    }

    let events = match state.registry.take_events(&user_id).await {
        Ok(events) => events,
        Err(e) => return respond::failure(&e),
    };

    info!(session_key = %user_id, "client connected to stream");
    let bridge = EventBridge::new(events, state.registry.clone(), user_id);

    Sse::new(bridge)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(KEEP_ALIVE_SECS))
                .text("keep-alive"),
        )
        .into_response()
}

/// POST /api/v1/chat/send/{user_id}
///
/// Queues one text message on the session's outbound sink and returns
/// immediately; the agent's reply arrives on the paired stream.
pub async fn send(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(message): Json<InboundMessage>,
) -> Response {
    let text = match message.into_text() {
        Ok(text) => text,
        Err(e) => {
            warn!(session_key = %user_id, error = %e, "rejected inbound message");
            return respond::failure(&e);
        }
    };

    match state.registry.send_text(&user_id, &text).await {
        Ok(()) => {
            info!(session_key = %user_id, "message queued for agent");
            respond::ok("Message sent successfully")
        }
        Err(e @ RelayError::SessionNotFound(_)) => respond::failure_with_message(
            &e,
            "Session not found. Please connect to the stream first.",
        ),
        Err(e) => {
            error!(session_key = %user_id, error = %e, "failed to queue message");
            respond::failure(&e)
        }
    }
}

/// DELETE /api/v1/chat/end-session/{user_id}
///
/// Closes the conversation and removes the session. Safe to race against
/// the stream's own cleanup: the loser sees an absent key.
pub async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Response {
    match state.registry.remove(&user_id).await {
        Some(_session) => {
            info!(session_key = %user_id, "chat session ended");
            respond::ok("Session ended successfully")
        }
        None => respond::failure(&RelayError::SessionNotFound(user_id)),
    }
}

/// GET /api/v1/chat/active-sessions
///
/// Diagnostics: the keys of every live session.
pub async fn active_sessions(State(state): State<Arc<AppState>>) -> Response {
    let keys = state.registry.keys().await;
    respond::success(
        serde_json::json!({
            "active_sessions": keys,
            "count": keys.len(),
        }),
        "Active sessions retrieved successfully",
    )
}

/// Bridges a session's raw event stream to SSE frames.
///
/// Each raw event runs through the translator as it arrives — no batching,
/// no buffering beyond the transport's. A mid-stream engine failure becomes
/// one `error` frame, then the stream ends. Cleanup is tied to drop, so a
/// client disconnect (axum drops the body stream) triggers it just like
/// normal exhaustion does; the registry makes the removal race-safe.
struct EventBridge {
    events: EventStream,
    registry: Arc<SessionRegistry>,
    key: String,
    finished: bool,
    cleaned: bool,
}

impl EventBridge {
    fn new(events: EventStream, registry: Arc<SessionRegistry>, key: String) -> Self {
        Self {
            events,
            registry,
            key,
            finished: false,
            cleaned: false,
        }
    }

    /// Close the conversation and release the registry entry, once.
    fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;
        let registry = self.registry.clone();
        let key = self.key.clone();
        tokio::spawn(async move {
            if registry.remove(&key).await.is_some() {
                info!(session_key = %key, "stream closed, session cleaned up");
            }
        });
    }

    fn frame(event: &RelayEvent) -> Event {
        // The fallback stays inside the frame protocol so clients never
        // see a shape they cannot dispatch on.
        Event::default().json_data(event).unwrap_or_else(|_| {
            Event::default().data(r#"{"type":"error","message":"event serialization failed"}"#)
        })
    }
}

impl futures_util::Stream for EventBridge {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        loop {
            match self.events.poll_recv(cx) {
                Poll::Ready(Some(Ok(raw))) => {
                    // Events with nothing to show are skipped, keep pulling.
                    if let Some(event) = translate(&raw) {
                        return Poll::Ready(Some(Ok(Self::frame(&event))));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    error!(session_key = %self.key, error = %e, "engine failure mid-stream");
                    self.finished = true;
                    self.cleanup();
                    let event = RelayEvent::error(e.to_string());
                    return Poll::Ready(Some(Ok(Self::frame(&event))));
                }
                Poll::Ready(None) => {
                    self.finished = true;
                    self.cleanup();
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Drop for EventBridge {
    fn drop(&mut self) {
        // Client disconnected (or the server is shutting the stream down):
        // the same cleanup path as normal exhaustion, guaranteed to run.
        self.cleanup();
    }
}
