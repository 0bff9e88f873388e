//! Route configuration for the chat endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{health, post_chat, ChatAppState};

/// Creates the chat router.
///
/// Routes:
/// - `POST /api/chat` - handle one chat turn
/// - `GET /health` - liveness probe
pub fn chat_router() -> Router<ChatAppState> {
    Router::new()
        .route("/api/chat", post(post_chat))
        .route("/health", get(health))
}
