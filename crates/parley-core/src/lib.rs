//! Core types and error definitions for the Parley relay.
//!
//! This crate provides the foundational types shared across all Parley
//! crates: the unified error enum, the normalized client-facing event
//! protocol, the inbound message boundary, and the uniform JSON response
//! envelope.
//!
//! # Main types
//!
//! - [`RelayError`] — Unified error enum for all Parley subsystems.
//! - [`RelayResult`] — Convenience alias for `Result<T, RelayError>`.
//! - [`RelayEvent`] — Normalized event pushed to stream clients.
//! - [`InboundMessage`] — Client-to-agent message, text-only by design.
//! - [`Envelope`] — The `{is_success, data, message, meta}` response shape.

/// Normalized event protocol and inbound message types.
pub mod event;
/// Uniform JSON response envelope.
pub mod envelope;

pub use envelope::Envelope;
pub use event::{InboundMessage, RelayEvent, TEXT_PLAIN};

/// Top-level error type for the Parley relay.
///
/// The first group of variants is the relay's error taxonomy — each one is
/// converted into a uniform failure envelope (or SSE error frame) at the
/// gateway boundary. The remaining variants cover ambient failures from
/// serialization, I/O, and outbound HTTP.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// An operation referenced a session key with no active session.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// A session (or user) already exists under the given key.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The agent engine failed to start or accept a conversation.
    #[error("agent engine unavailable: {0}")]
    UpstreamUnavailable(String),

    /// An inbound message carried a media type other than `text/plain`.
    #[error("unsupported media type: {0}. Only text/plain is supported")]
    UnsupportedMediaType(String),

    /// A bearer token was valid once but has expired.
    #[error("token expired")]
    TokenExpired,

    /// A bearer token could not be decoded or its signature is wrong.
    #[error("malformed token: {0}")]
    TokenMalformed(String),

    /// A write was attempted on a conversation that has been closed.
    #[error("conversation closed")]
    ConversationClosed,

    /// Credentials did not match a known user.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// An error from the user store or other persistence.
    #[error("storage error: {0}")]
    Storage(String),

    /// An error from an outbound HTTP request to the agent engine.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A JSON serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used across all Parley crates.
pub type RelayResult<T> = Result<T, RelayError>;
