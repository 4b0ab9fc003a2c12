use std::sync::Arc;

use axum::middleware as axum_mw;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::Router;
use parley_auth::{TokenService, UserStore};
use parley_engine::AgentEngine;
use parley_session::SessionRegistry;
use tracing::info;
use uuid::Uuid;

use crate::{auth, chat, middleware};

/// Shared application state, injected into every handler.
///
/// The registry is owned here — no ambient globals — so tests can build a
/// gateway around a fake engine and a throwaway store.
pub struct AppState {
    /// The session registry; the only shared mutable structure.
    pub registry: Arc<SessionRegistry>,
    /// The agent engine behind the relay.
    pub engine: Arc<dyn AgentEngine>,
    /// User persistence for signup/login.
    pub users: Arc<dyn UserStore>,
    /// Token issuance and verification.
    pub tokens: Arc<TokenService>,
    /// Whether chat endpoints require a bearer token.
    pub require_auth: bool,
}

/// The main gateway server.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the gateway without token enforcement (local dev, tests).
    ///
    /// Tokens are still issued on signup/login, signed with an ephemeral
    /// secret that dies with the process.
    pub fn build(engine: Arc<dyn AgentEngine>, users: Arc<dyn UserStore>) -> Router {
        let ephemeral = Uuid::new_v4();
        let tokens = Arc::new(TokenService::new(ephemeral.as_bytes()));
        Self::build_with_auth(engine, users, tokens, false)
    }

    /// Build the gateway with a configured token service.
    pub fn build_with_auth(
        engine: Arc<dyn AgentEngine>,
        users: Arc<dyn UserStore>,
        tokens: Arc<TokenService>,
        require_auth: bool,
    ) -> Router {
        if require_auth {
            info!("bearer token auth enabled on chat endpoints");
        }

        let state = Arc::new(AppState {
            registry: Arc::new(SessionRegistry::new()),
            engine,
            users,
            tokens,
            require_auth,
        });

        let chat_routes = Router::new()
            .route("/start-session", post(chat::start_session))
            .route("/stream/{user_id}", get(chat::stream))
            .route("/send/{user_id}", post(chat::send))
            .route("/end-session/{user_id}", delete(chat::end_session))
            .route("/active-sessions", get(chat::active_sessions))
            .route_layer(axum_mw::from_fn_with_state(
                state.clone(),
                middleware::require_token,
            ));

        let auth_routes = Router::new()
            .route("/create-user", post(auth::create_user))
            .route("/login", post(auth::login));

        Router::new()
            .route("/health", get(health_handler))
            .nest("/api/v1/chat", chat_routes)
            .nest("/api/v1/auth", auth_routes)
            .with_state(state)
    }
}

async fn health_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({"status": "ok", "service": "parley"}))
}
