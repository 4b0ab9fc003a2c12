//! The Parley HTTP gateway.
//!
//! Exposes the chat-session relay (start / stream / send / end /
//! active-sessions) and the auth endpoints (create-user / login) over
//! axum, with bearer-token middleware and a uniform JSON response
//! envelope. Streaming uses server-sent events; every frame is one
//! [`parley_core::RelayEvent`] JSON object.

/// Auth endpoints: signup and login.
pub mod auth;
/// Relay endpoints and the SSE bridge.
pub mod chat;
/// Bearer token middleware.
pub mod middleware;
/// Envelope response helpers and status mapping.
pub mod respond;
/// The router builder and shared state.
pub mod server;
/// Engine event to client event translation.
pub mod translate;

pub use server::{AppState, GatewayServer};
