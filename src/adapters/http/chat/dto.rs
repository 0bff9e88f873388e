//! HTTP DTOs for the chat endpoint.
//!
//! The JSON boundary of the turn API. DTO shapes are decoupled from the
//! domain types and serialize camelCase.

use serde::{Deserialize, Serialize};

use crate::domain::chat::{EnhancedResponse, TurnResponse};

// ── Request DTOs ────────────────────────────────────────────────────────────

/// One inbound chat turn.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The user's message. Required; validated in the handler so a missing
    /// field yields 400 rather than a deserialization rejection.
    #[serde(default)]
    pub message: Option<String>,
    /// Session to continue, when the client did not send the cookie.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Opaque caller-side visitor reference.
    #[serde(default)]
    pub user_id: Option<String>,
}

// ── Response DTOs ───────────────────────────────────────────────────────────

/// A follow-up action chip.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDto {
    pub kind: String,
    pub label: String,
    pub target: String,
}

/// The reply payload the widget renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyDto {
    pub text: String,
    pub quick_replies: Vec<String>,
    pub actions: Vec<ActionDto>,
}

/// Classified intent of the turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentDto {
    pub name: String,
    pub confidence: Option<f32>,
}

/// The completed turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: ReplyDto,
    pub session_id: String,
    pub intent: IntentDto,
    pub escalated: bool,
}

impl From<TurnResponse> for ChatResponse {
    fn from(turn: TurnResponse) -> Self {
        Self {
            response: ReplyDto::from(turn.response),
            session_id: turn.session_id.to_string(),
            intent: IntentDto {
                name: turn.intent.name().to_string(),
                confidence: turn.confidence,
            },
            escalated: turn.escalated,
        }
    }
}

impl From<EnhancedResponse> for ReplyDto {
    fn from(reply: EnhancedResponse) -> Self {
        Self {
            text: reply.text,
            quick_replies: reply.quick_replies,
            actions: reply
                .actions
                .into_iter()
                .map(|a| ActionDto {
                    kind: a.kind,
                    label: a.label,
                    target: a.target,
                })
                .collect(),
        }
    }
}

/// Standard error body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    /// Creates a 400-style error body.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "VALIDATION_FAILED".to_string(),
        }
    }

    /// Creates a 500-style error body.
    pub fn internal() -> Self {
        Self {
            error: "Something went wrong".to_string(),
            code: "INTERNAL_ERROR".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_accepts_minimal_body() {
        let request: ChatRequest = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert_eq!(request.message.as_deref(), Some("hi"));
        assert!(request.session_id.is_none());
    }

    #[test]
    fn chat_request_reads_camel_case_keys() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"message": "hi", "sessionId": "abc", "userId": "v1"}"#)
                .unwrap();
        assert_eq!(request.session_id.as_deref(), Some("abc"));
        assert_eq!(request.user_id.as_deref(), Some("v1"));
    }

    #[test]
    fn chat_request_tolerates_missing_message() {
        let request: ChatRequest = serde_json::from_str("{}").unwrap();
        assert!(request.message.is_none());
    }

    #[test]
    fn response_serializes_camel_case() {
        let response = ChatResponse {
            response: ReplyDto {
                text: "hi".to_string(),
                quick_replies: vec!["Book a repair".to_string()],
                actions: Vec::new(),
            },
            session_id: "s".to_string(),
            intent: IntentDto {
                name: "general".to_string(),
                confidence: None,
            },
            escalated: false,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"quickReplies\""));
        assert!(json.contains("\"sessionId\""));
    }
}
