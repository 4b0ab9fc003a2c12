use async_trait::async_trait;
use futures_util::StreamExt;
use parley_core::{RelayError, RelayResult};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::conversation::{Conversation, MessageSink, SinkCommand};
use crate::raw::RawEvent;
use crate::AgentEngine;

/// Capacity of a conversation's event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Client for a remote agent runtime.
///
/// Conversation lifecycle over plain HTTP:
///
/// - `POST   {base}/v1/conversations` with `{user_id, response_modalities}`
///   creates a conversation and returns its id.
/// - `GET    {base}/v1/conversations/{id}/events` is a server-sent-event
///   feed of [`RawEvent`] JSON frames, one `data:` line each.
/// - `POST   {base}/v1/conversations/{id}/messages` forwards one user
///   message.
/// - `DELETE {base}/v1/conversations/{id}` terminates the conversation.
pub struct HttpEngine {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct CreateConversationResponse {
    conversation_id: String,
}

impl HttpEngine {
    /// Engine talking to the runtime at `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AgentEngine for HttpEngine {
    async fn start_conversation(&self, user_id: &str) -> RelayResult<Conversation> {
        let create_url = format!("{}/v1/conversations", self.base_url);
        let body = serde_json::json!({
            "user_id": user_id,
            "response_modalities": ["TEXT"],
        });

        let resp = self
            .http
            .post(&create_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::UpstreamUnavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_else(|_| "unknown error".to_string());
            return Err(RelayError::UpstreamUnavailable(format!(
                "engine returned {status}: {detail}"
            )));
        }

        let created: CreateConversationResponse = resp
            .json()
            .await
            .map_err(|e| RelayError::UpstreamUnavailable(e.to_string()))?;
        let conversation_id = created.conversation_id;
        debug!(conversation_id = %conversation_id, user_id = %user_id, "conversation created");

        let (sink, commands) = MessageSink::channel();
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        // Reader: consume the SSE feed and forward parsed events.
        let events_url = format!("{}/v1/conversations/{}/events", self.base_url, conversation_id);
        let reader_http = self.http.clone();
        tokio::spawn(read_event_feed(reader_http, events_url, events_tx));

        // Writer: forward outbound messages, delete the conversation when
        // the sink closes.
        let writer_http = self.http.clone();
        let base_url = self.base_url.clone();
        tokio::spawn(forward_outbound(
            writer_http,
            base_url,
            conversation_id,
            commands,
        ));

        Ok(Conversation {
            events: events_rx,
            sink,
        })
    }
}

/// Pull the SSE feed, split `data:` lines, and forward each parsed event.
async fn read_event_feed(
    http: reqwest::Client,
    events_url: String,
    events_tx: mpsc::Sender<RelayResult<RawEvent>>,
) {
    let resp = match http.get(&events_url).send().await {
        Ok(r) if r.status().is_success() => r,
        Ok(r) => {
            let _ = events_tx
                .send(Err(RelayError::UpstreamUnavailable(format!(
                    "event feed returned {}",
                    r.status()
                ))))
                .await;
            return;
        }
        Err(e) => {
            let _ = events_tx
                .send(Err(RelayError::UpstreamUnavailable(e.to_string())))
                .await;
            return;
        }
    };

    let mut stream = resp.bytes_stream();
    let mut buffer = String::new();

    while let Some(chunk_result) = stream.next().await {
        let chunk = match chunk_result {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = events_tx
                    .send(Err(RelayError::Http(format!("stream read error: {e}"))))
                    .await;
                return;
            }
        };

        buffer.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(line_end) = buffer.find('\n') {
            let line = buffer[..line_end].trim().to_string();
            buffer = buffer[line_end + 1..].to_string();

            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            let Some(data) = line.strip_prefix("data: ") else {
                continue;
            };

            let event: RawEvent = match serde_json::from_str(data) {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "dropping unparseable engine event");
                    continue;
                }
            };

            if events_tx.send(Ok(event)).await.is_err() {
                // Reader side is gone; stop pulling.
                return;
            }
        }
    }
    // Feed exhausted: dropping events_tx ends the session's event stream.
}

/// Forward outbound messages; always delete the conversation on exit.
async fn forward_outbound(
    http: reqwest::Client,
    base_url: String,
    conversation_id: String,
    mut commands: mpsc::UnboundedReceiver<SinkCommand>,
) {
    let messages_url = format!("{base_url}/v1/conversations/{conversation_id}/messages");

    while let Some(command) = commands.recv().await {
        match command {
            SinkCommand::Text(data) => {
                let body = serde_json::json!({
                    "mime_type": "text/plain",
                    "data": data,
                });
                // Fire-and-forget from the caller's perspective; a delivery
                // failure is logged, the reply path reports engine errors.
                match http.post(&messages_url).json(&body).send().await {
                    Ok(resp) if resp.status().is_success() => {}
                    Ok(resp) => {
                        warn!(status = %resp.status(), conversation_id = %conversation_id,
                            "engine rejected outbound message");
                    }
                    Err(e) => {
                        warn!(error = %e, conversation_id = %conversation_id,
                            "failed to deliver outbound message");
                    }
                }
            }
            SinkCommand::Close => break,
        }
    }

    let delete_url = format!("{base_url}/v1/conversations/{conversation_id}");
    if let Err(e) = http.delete(&delete_url).send().await {
        warn!(error = %e, conversation_id = %conversation_id, "failed to delete conversation");
    }
    debug!(conversation_id = %conversation_id, "conversation closed");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn unreachable_engine_is_upstream_unavailable() {
        // Nothing listens on this port.
        let engine = HttpEngine::new("http://127.0.0.1:1");
        let err = engine.start_conversation("u1").await.unwrap_err();
        assert!(matches!(err, RelayError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn engine_error_status_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/conversations"))
            .respond_with(ResponseTemplate::new(503).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let engine = HttpEngine::new(server.uri());
        let err = engine.start_conversation("u1").await.unwrap_err();
        match err {
            RelayError::UpstreamUnavailable(msg) => assert!(msg.contains("quota exceeded")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn events_parse_from_sse_feed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/conversations"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"conversation_id": "conv-1"})),
            )
            .mount(&server)
            .await;

        let feed = concat!(
            "data: {\"content\":{\"parts\":[{\"text\":\"hi\"}]},\"partial\":true}\n\n",
            ": keep-alive\n\n",
            "data: {\"turn_complete\":true}\n\n",
        );
        Mock::given(method("GET"))
            .and(path("/v1/conversations/conv-1/events"))
            .respond_with(ResponseTemplate::new(200).set_body_string(feed))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v1/conversations/conv-1"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let engine = HttpEngine::new(server.uri());
        let mut conv = engine.start_conversation("u1").await.unwrap();

        let first = conv.events.recv().await.unwrap().unwrap();
        assert_eq!(first.first_part().unwrap().text.as_deref(), Some("hi"));
        assert!(first.partial);

        let second = conv.events.recv().await.unwrap().unwrap();
        assert!(second.turn_complete);

        // Feed is exhausted after the two events.
        assert!(conv.events.recv().await.is_none());
    }
}
