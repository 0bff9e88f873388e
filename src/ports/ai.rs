//! AI ports - field extraction and generative replies.
//!
//! Two small contracts instead of one provider facade: the orchestrator
//! composes them differently. Extraction sits behind a deterministic
//! fallback and a timeout; reply generation falls back to a canned
//! business-contact message. Neither failure may surface to the user.
//!
//! # Design
//!
//! - Provider-agnostic: adapters translate to OpenAI-style chat completions
//! - Errors are typed so the orchestrator can log the failure mode
//! - `AiError::is_retryable` exists for adapters, not for the orchestrator,
//!   which never retries inside a turn

use async_trait::async_trait;

use crate::domain::chat::{ExtractedFields, IntentCategory};

/// Port for model-backed field extraction.
///
/// Implementations return per-field confidences; the caller applies its own
/// acceptance threshold.
#[async_trait]
pub trait FieldExtraction: Send + Sync {
    /// Extracts customer fields from one user message.
    ///
    /// # Errors
    ///
    /// Any provider failure. The caller treats every error identically:
    /// fall back to deterministic rules.
    async fn extract_fields(&self, text: &str) -> Result<ExtractedFields, AiError>;
}

/// Port for generating conversational replies.
#[async_trait]
pub trait GenerativeResponder: Send + Sync {
    /// Generates a reply for the current turn.
    async fn respond(&self, request: &ResponderRequest) -> Result<GeneratedReply, AiError>;
}

/// Input to reply generation.
#[derive(Debug, Clone)]
pub struct ResponderRequest {
    /// Sanitized current user message.
    pub message: String,
    /// Recent turn texts, oldest first, prefixed "user:" / "bot:".
    pub history: Vec<String>,
    /// Category the classifiers settled on for this turn.
    pub category: IntentCategory,
}

impl ResponderRequest {
    /// Creates a request with no history.
    pub fn new(message: impl Into<String>, category: IntentCategory) -> Self {
        Self {
            message: message.into(),
            history: Vec::new(),
            category,
        }
    }

    /// Attaches recent conversation history.
    pub fn with_history(mut self, history: Vec<String>) -> Self {
        self.history = history;
        self
    }
}

/// A generated reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedReply {
    pub text: String,
    /// Provider-suggested quick replies; the enhancer may replace them.
    pub quick_replies: Vec<String>,
}

impl GeneratedReply {
    /// Creates a plain text reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quick_replies: Vec::new(),
        }
    }
}

/// AI port errors.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// Provider is down or overloaded.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// Network failure during the request.
    #[error("network error: {0}")]
    Network(String),

    /// Provider responded but the payload did not parse.
    #[error("parse error: {0}")]
    Parse(String),

    /// API key rejected.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Request exceeded the configured deadline.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Request was malformed before it left the process.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl AiError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if a retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AiError::Unavailable(_) | AiError::Network(_) | AiError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ports_are_object_safe() {
        fn _extraction(_p: &dyn FieldExtraction) {}
        fn _responder(_p: &dyn GenerativeResponder) {}
    }

    #[test]
    fn retryable_classification() {
        assert!(AiError::unavailable("down").is_retryable());
        assert!(AiError::network("reset").is_retryable());
        assert!(AiError::Timeout { timeout_secs: 5 }.is_retryable());

        assert!(!AiError::AuthenticationFailed.is_retryable());
        assert!(!AiError::parse("bad json").is_retryable());
    }

    #[test]
    fn responder_request_builder() {
        let request = ResponderRequest::new("hello", IntentCategory::General)
            .with_history(vec!["user: hi".to_string()]);
        assert_eq!(request.history.len(), 1);
        assert_eq!(request.category, IntentCategory::General);
    }
}
