//! Session aggregate for a chat conversation.
//!
//! A session owns the ordered message history plus the escalation and
//! resolution flags. Sessions are ephemeral: the store that holds them gives
//! no persistence guarantee, and they are destroyed by a TTL sweep.

use crate::domain::foundation::{SessionId, Timestamp};
use serde::{Deserialize, Serialize};

use super::message::Message;

/// A chat session.
///
/// # Invariants
///
/// - `messages` is append-only and chronological
/// - `escalated` is monotonic: once true, never reset
/// - `created_at` never changes; `last_activity` moves forward only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    /// Opaque reference supplied by the caller (e.g. a site visitor id).
    user_ref: Option<String>,
    created_at: Timestamp,
    last_activity: Timestamp,
    messages: Vec<Message>,
    escalated: bool,
    resolved: bool,
}

impl Session {
    /// Creates a new session for an optional user reference.
    pub fn new(user_ref: Option<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: SessionId::new(),
            user_ref,
            created_at: now,
            last_activity: now,
            messages: Vec::new(),
            escalated: false,
            resolved: false,
        }
    }

    /// Reconstructs a fresh session shell under an existing id.
    ///
    /// Used when the session map lost its entry (process restart) but flow
    /// state for the id survived in the longer-lived state store: the history
    /// is gone, the id and the flow context are not.
    pub fn shell(id: SessionId) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            user_ref: None,
            created_at: now,
            last_activity: now,
            messages: Vec::new(),
            escalated: false,
            resolved: false,
        }
    }

    /// Returns the session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the caller-supplied user reference, if any.
    pub fn user_ref(&self) -> Option<&str> {
        self.user_ref.as_deref()
    }

    /// Returns when the session was created.
    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    /// Returns the last-activity timestamp.
    pub fn last_activity(&self) -> &Timestamp {
        &self.last_activity
    }

    /// Returns the full message history, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns up to the last `n` messages, oldest first.
    pub fn recent_messages(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Returns true if the session has been escalated to a human.
    pub fn is_escalated(&self) -> bool {
        self.escalated
    }

    /// Returns true if the session has been marked resolved.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Appends a message and advances last-activity.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
        self.touch();
    }

    /// Advances the last-activity timestamp to now.
    pub fn touch(&mut self) {
        self.last_activity = Timestamp::now();
    }

    /// Raises the escalation flag. Monotonic: cannot be lowered.
    pub fn escalate(&mut self) {
        self.escalated = true;
    }

    /// Marks the session resolved.
    pub fn resolve(&mut self) {
        self.resolved = true;
    }

    /// Returns true if last activity is older than `ttl_secs`.
    pub fn is_expired(&self, ttl_secs: u64) -> bool {
        self.last_activity.age_secs() > ttl_secs
    }
}
