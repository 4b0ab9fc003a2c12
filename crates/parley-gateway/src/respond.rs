use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use parley_core::{Envelope, RelayError};
use serde::Serialize;

/// A 200 success envelope carrying `data`.
pub fn success<T: Serialize>(data: T, message: &str) -> Response {
    (StatusCode::OK, Json(Envelope::success(data, message))).into_response()
}

/// A 200 success envelope with no payload.
pub fn ok(message: &str) -> Response {
    (StatusCode::OK, Json(Envelope::<serde_json::Value>::ok(message))).into_response()
}

/// A failure envelope with the status implied by the error.
pub fn failure(err: &RelayError) -> Response {
    failure_with_message(err, &err.to_string())
}

/// A failure envelope with the status implied by the error but a custom
/// message (used where clients depend on specific wording).
pub fn failure_with_message(err: &RelayError, message: &str) -> Response {
    (
        status_for(err),
        Json(Envelope::<serde_json::Value>::error(message)),
    )
        .into_response()
}

fn status_for(err: &RelayError) -> StatusCode {
    match err {
        RelayError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        RelayError::Conflict(_) | RelayError::ConversationClosed => StatusCode::CONFLICT,
        RelayError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        RelayError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        RelayError::TokenExpired | RelayError::TokenMalformed(_) | RelayError::AuthFailed(_) => {
            StatusCode::UNAUTHORIZED
        }
        RelayError::Storage(_)
        | RelayError::Http(_)
        | RelayError::Serialization(_)
        | RelayError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
