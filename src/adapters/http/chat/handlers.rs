//! HTTP handlers for the chat endpoints.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::domain::chat::{ChatOrchestrator, TurnRequest};
use crate::domain::foundation::{ErrorCode, SessionId};

use super::dto::{ChatRequest, ChatResponse, ErrorResponse};

/// Cookie carrying the session id. Read in preference to the body value.
pub const SESSION_COOKIE: &str = "repairline_session";

/// Cookie lifetime. Longer than the session TTL on purpose so a swept
/// session id can still recover surviving flow state.
const COOKIE_MAX_AGE_SECS: u64 = 24 * 60 * 60;

/// Shared state for the chat routes.
#[derive(Clone)]
pub struct ChatAppState {
    pub orchestrator: Arc<ChatOrchestrator>,
}

/// POST /api/chat - handle one chat turn.
pub async fn post_chat(
    State(state): State<ChatAppState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = payload else {
        return bad_request("Request body must be a JSON object");
    };
    let Some(message) = request.message.filter(|m| !m.trim().is_empty()) else {
        return bad_request("A non-empty \"message\" field is required");
    };

    let session_id = cookie_session_id(&headers)
        .or_else(|| request.session_id.as_deref().and_then(parse_session_id));

    let turn = TurnRequest {
        message,
        session_id,
        user_ref: request.user_id,
    };
    match state.orchestrator.handle_turn(turn).await {
        Ok(turn) => {
            let cookie = format!(
                "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
                SESSION_COOKIE, turn.session_id, COOKIE_MAX_AGE_SECS
            );
            let body = Json(ChatResponse::from(turn));
            ([(header::SET_COOKIE, cookie)], body).into_response()
        }
        Err(err) if err.code == ErrorCode::ValidationFailed => bad_request(err.message),
        Err(err) => {
            tracing::error!(error = %err, "turn failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::internal())).into_response()
        }
    }
}

/// GET /health - liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::bad_request(message)),
    )
        .into_response()
}

fn parse_session_id(raw: &str) -> Option<SessionId> {
    // An unparseable id is treated as absent: the turn starts a fresh
    // session instead of failing.
    SessionId::from_str(raw).ok()
}

fn cookie_session_id(headers: &HeaderMap) -> Option<SessionId> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE)
            .then(|| parse_session_id(value.trim()))
            .flatten()
    })
}
