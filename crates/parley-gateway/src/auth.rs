use std::sync::Arc;

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use parley_auth::{hash_password, verify_password, User};
use parley_core::RelayError;
use serde::Deserialize;
use tracing::{info, warn};

use crate::respond;
use crate::server::AppState;

/// Body of `POST /api/v1/auth/create-user`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Display name.
    pub username: String,
    /// Login email; must be unique.
    pub email: String,
    /// Plaintext password; only its digest is stored.
    pub password: String,
}

/// Body of `POST /api/v1/auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// POST /api/v1/auth/create-user
///
/// Registers a user and returns a bearer token so the client can start
/// chatting right away. Duplicate emails conflict.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Response {
    match state.users.find_by_email(&req.email).await {
        Ok(Some(_)) => {
            return respond::failure_with_message(
                &RelayError::Conflict(req.email),
                "User with this email already exists",
            );
        }
        Ok(None) => {}
        Err(e) => return respond::failure(&e),
    }

    let digest = match hash_password(&req.password) {
        Ok(digest) => digest,
        Err(e) => return respond::failure(&e),
    };

    let user = User::new(req.username, req.email, digest);
    if let Err(e) = state.users.create(&user).await {
        return respond::failure(&e);
    }

    let token = match state.tokens.issue(&user.email) {
        Ok(token) => token,
        Err(e) => return respond::failure(&e),
    };

    info!(user_id = %user.id, "user created");
    respond::success(
        serde_json::json!({
            "user": {
                "id": user.id,
                "name": user.name,
                "email": user.email,
            },
            "access_token": token,
            "token_type": "bearer",
        }),
        "User created successfully",
    )
}

/// POST /api/v1/auth/login
///
/// Verifies credentials and issues a fresh bearer token. Unknown email and
/// wrong password are indistinguishable to the caller.
pub async fn login(State(state): State<Arc<AppState>>, Json(req): Json<LoginRequest>) -> Response {
    let rejected = || {
        respond::failure_with_message(
            &RelayError::AuthFailed("invalid credentials".into()),
            "Invalid email or password",
        )
    };

    let user = match state.users.find_by_email(&req.email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("login rejected: unknown email");
            return rejected();
        }
        Err(e) => return respond::failure(&e),
    };

    match verify_password(&req.password, &user.password_digest) {
        Ok(true) => {}
        Ok(false) => {
            warn!(user_id = %user.id, "login rejected: wrong password");
            return rejected();
        }
        Err(e) => return respond::failure(&e),
    }

    let token = match state.tokens.issue(&user.email) {
        Ok(token) => token,
        Err(e) => return respond::failure(&e),
    };

    info!(user_id = %user.id, "user logged in");
    respond::success(
        serde_json::json!({
            "user": {
                "id": user.id,
                "name": user.name,
                "email": user.email,
            },
            "access_token": token,
            "token_type": "bearer",
        }),
        "Login successful",
    )
}
