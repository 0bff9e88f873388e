//! Session store port.
//!
//! Contract for session lifecycle storage. The store is authoritative for
//! session lookup but offers no durability guarantee; the orchestrator is
//! written to survive a store that forgot a session it once returned.

use async_trait::async_trait;

use crate::domain::chat::Session;
use crate::domain::foundation::{DomainError, SessionId};

/// Port for session persistence.
///
/// Implementations must treat sessions as whole values: `save` replaces the
/// stored session, there are no partial updates.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates and stores a new session.
    ///
    /// # Errors
    ///
    /// Storage failure.
    async fn create(&self, user_ref: Option<String>) -> Result<Session, DomainError>;

    /// Fetches a session by id, refreshing its last-activity timestamp.
    ///
    /// Returns `None` when the id is unknown or already swept.
    async fn get(&self, id: &SessionId) -> Result<Option<Session>, DomainError>;

    /// Stores the session, replacing any previous value under its id.
    async fn save(&self, session: &Session) -> Result<(), DomainError>;

    /// Removes a session. Removing an unknown id is not an error.
    async fn remove(&self, id: &SessionId) -> Result<(), DomainError>;

    /// Drops sessions idle longer than `ttl_secs`. Returns how many were
    /// removed.
    async fn sweep_expired(&self, ttl_secs: u64) -> Result<usize, DomainError>;
}
