//! Message entity for chat sessions.
//!
//! Messages are immutable records of user/bot exchanges within a session.
//! Each message has a sender, text, timestamp, a kind tag (plain text vs.
//! quick-reply-bearing), and optional classification metadata.

use crate::domain::foundation::{DomainError, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::intent::IntentCategory;

/// Unique identifier for a message within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new random MessageId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a MessageId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The customer on the website chat widget.
    User,
    /// The orchestrated bot reply.
    Bot,
}

/// Shape of a message payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain text only.
    Text,
    /// Text accompanied by quick-reply affordances.
    QuickReply,
}

/// Optional classification metadata attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMeta {
    /// Classified intent category, when the turn was classified.
    pub intent: Option<IntentCategory>,
    /// Classifier confidence for the intent, 0.0..=1.0.
    pub confidence: Option<f32>,
    /// Marks the message as part of an escalated exchange.
    pub escalated: bool,
}

/// An immutable message within a session.
///
/// # Invariants
///
/// - `id` is globally unique
/// - `text` is non-empty (validated at construction)
/// - `sent_at` is set at construction and never changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    sender: Sender,
    text: String,
    kind: MessageKind,
    sent_at: Timestamp,
    meta: Option<MessageMeta>,
}

impl Message {
    /// Creates a new plain-text message.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if text is empty
    pub fn new(sender: Sender, text: impl Into<String>) -> Result<Self, DomainError> {
        let text = text.into();
        Self::validate_text(&text)?;

        Ok(Self {
            id: MessageId::new(),
            sender,
            text,
            kind: MessageKind::Text,
            sent_at: Timestamp::now(),
            meta: None,
        })
    }

    /// Creates a user message.
    pub fn user(text: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(Sender::User, text)
    }

    /// Creates a bot message.
    pub fn bot(text: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(Sender::Bot, text)
    }

    /// Marks this message as carrying quick replies.
    pub fn with_quick_replies(mut self) -> Self {
        self.kind = MessageKind::QuickReply;
        self
    }

    /// Attaches classification metadata.
    pub fn with_meta(mut self, meta: MessageMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Returns the message ID.
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    /// Returns who sent the message.
    pub fn sender(&self) -> Sender {
        self.sender
    }

    /// Returns the text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the payload kind.
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Returns when the message was sent.
    pub fn sent_at(&self) -> &Timestamp {
        &self.sent_at
    }

    /// Returns the classification metadata, if any.
    pub fn meta(&self) -> Option<&MessageMeta> {
        self.meta.as_ref()
    }

    /// Returns true if this message is from the user.
    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    fn validate_text(text: &str) -> Result<(), DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::validation(
                "text",
                "Message text cannot be empty",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod message_id {
        use super::*;

        #[test]
        fn generates_unique_values() {
            assert_ne!(MessageId::new(), MessageId::new());
        }

        #[test]
        fn from_uuid_preserves_value() {
            let uuid = Uuid::new_v4();
            let id = MessageId::from_uuid(uuid);
            assert_eq!(id.as_uuid(), &uuid);
        }
    }

    mod construction {
        use super::*;

        #[test]
        fn user_creates_user_message() {
            let msg = Message::user("AC not cooling").unwrap();
            assert!(msg.is_user());
            assert_eq!(msg.sender(), Sender::User);
            assert_eq!(msg.text(), "AC not cooling");
            assert_eq!(msg.kind(), MessageKind::Text);
        }

        #[test]
        fn bot_creates_bot_message() {
            let msg = Message::bot("How can I help?").unwrap();
            assert!(!msg.is_user());
            assert_eq!(msg.sender(), Sender::Bot);
        }

        #[test]
        fn rejects_empty_text() {
            assert!(Message::user("").is_err());
        }

        #[test]
        fn rejects_whitespace_only_text() {
            assert!(Message::user("   ").is_err());
        }

        #[test]
        fn with_quick_replies_sets_kind() {
            let msg = Message::bot("Choose an option").unwrap().with_quick_replies();
            assert_eq!(msg.kind(), MessageKind::QuickReply);
        }

        #[test]
        fn with_meta_attaches_classification() {
            let meta = MessageMeta {
                intent: Some(IntentCategory::ServiceRequest),
                confidence: Some(0.8),
                escalated: true,
            };
            let msg = Message::user("fridge leaking badly").unwrap().with_meta(meta.clone());
            assert_eq!(msg.meta(), Some(&meta));
        }

        #[test]
        fn sets_sent_at() {
            let msg = Message::user("hello").unwrap();
            let now = Timestamp::now();
            assert!(msg.sent_at().as_datetime() <= now.as_datetime());
        }
    }

    mod serialization {
        use super::*;

        #[test]
        fn sender_serializes_snake_case() {
            assert_eq!(serde_json::to_string(&Sender::User).unwrap(), "\"user\"");
            assert_eq!(serde_json::to_string(&Sender::Bot).unwrap(), "\"bot\"");
        }

        #[test]
        fn kind_serializes_snake_case() {
            assert_eq!(
                serde_json::to_string(&MessageKind::QuickReply).unwrap(),
                "\"quick_reply\""
            );
        }
    }
}
