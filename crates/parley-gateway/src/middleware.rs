use std::sync::Arc;

use axum::extract::{Query, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use parley_core::RelayError;
use tracing::warn;

use crate::respond;
use crate::server::AppState;

/// Query-string fallback for clients that cannot set headers (browser
/// `EventSource` streams, mostly).
#[derive(serde::Deserialize, Default)]
pub struct TokenQuery {
    /// Bearer token as a query parameter.
    pub token: Option<String>,
}

/// Bearer token middleware for the chat endpoints.
///
/// Checks `Authorization: Bearer <token>` first, then `?token=<token>`.
/// Disabled (all requests pass) when the gateway was built without
/// enforcement. Expired and malformed tokens both yield 401 envelopes, but
/// with distinct messages so clients know whether to re-authenticate.
pub async fn require_token(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    if !state.require_auth {
        return next.run(request).await;
    }

    let header_token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(ToString::to_string);

    let Some(token) = header_token.or(query.token) else {
        warn!("rejected request: missing bearer token");
        return respond::failure(&RelayError::TokenMalformed("missing token".into()));
    };

    match state.tokens.verify(&token) {
        Ok(_claims) => next.run(request).await,
        Err(e) => {
            warn!(error = %e, "rejected request: token verification failed");
            respond::failure(&e)
        }
    }
}
