//! The opaque agent-engine boundary.
//!
//! Parley treats the conversational agent engine as an external collaborator
//! with a start/send/receive/close contract. This crate defines that
//! contract ([`AgentEngine`]), the raw event shapes the engine produces
//! ([`RawEvent`]), and the duplex [`Conversation`] handle the relay holds
//! for each session.
//!
//! Two implementations ship with the workspace:
//!
//! - [`ScriptedEngine`] — an in-process engine that answers every inbound
//!   text with a deterministic chunked reply. Used by tests and local dev.
//! - [`HttpEngine`] — a client for a remote agent runtime: conversations
//!   are created over HTTP, events arrive on an SSE feed, outbound messages
//!   are posted, and the conversation is deleted on close.
//!
//! To add a new engine: implement [`AgentEngine`] in a new module and wire
//! it up in the CLI's engine selection.

/// Duplex conversation handle: event stream plus outbound sink.
pub mod conversation;
/// Remote agent runtime client.
pub mod http;
/// Raw engine event shapes.
pub mod raw;
/// Deterministic in-process engine for tests and local dev.
pub mod scripted;

use async_trait::async_trait;
use parley_core::RelayResult;

pub use conversation::{Conversation, EventStream, MessageSink};
pub use http::HttpEngine;
pub use raw::{RawBlob, RawContent, RawEvent, RawPart};
pub use scripted::ScriptedEngine;

/// The contract every agent engine implements.
///
/// A conversation is scoped to one user, requests text-only response
/// modality, and stays open until its sink is closed. Startup failures
/// (engine unreachable, quota exceeded) surface as
/// [`parley_core::RelayError::UpstreamUnavailable`]; callers must not
/// register a session for a conversation that failed to start.
#[async_trait]
pub trait AgentEngine: Send + Sync {
    /// Open a new conversation for `user_id`.
    async fn start_conversation(&self, user_id: &str) -> RelayResult<Conversation>;
}
