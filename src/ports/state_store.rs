//! Flow state store port.
//!
//! Typed per-flow slots keyed by session id. Kept separate from the session
//! store on purpose: flow state carries partially collected customer data
//! and outlives a lost session, which is what makes session-shell recovery
//! possible.

use async_trait::async_trait;

use crate::domain::chat::{BulkOrderState, CallbackState};
use crate::domain::foundation::{DomainError, SessionId};

/// Port for conversation flow state persistence.
///
/// At most one state per flow kind per session. Setting a slot replaces the
/// previous value; clearing an empty slot is not an error.
#[async_trait]
pub trait FlowStateStore: Send + Sync {
    async fn set_callback(
        &self,
        session: &SessionId,
        state: CallbackState,
    ) -> Result<(), DomainError>;

    async fn get_callback(&self, session: &SessionId)
        -> Result<Option<CallbackState>, DomainError>;

    async fn clear_callback(&self, session: &SessionId) -> Result<(), DomainError>;

    async fn set_bulk_order(
        &self,
        session: &SessionId,
        state: BulkOrderState,
    ) -> Result<(), DomainError>;

    async fn get_bulk_order(
        &self,
        session: &SessionId,
    ) -> Result<Option<BulkOrderState>, DomainError>;

    async fn clear_bulk_order(&self, session: &SessionId) -> Result<(), DomainError>;

    /// Drops flow states older than `max_age_secs` (by their started-at
    /// clock, not the session's). Returns how many slots were cleared.
    async fn sweep_expired(&self, max_age_secs: u64) -> Result<usize, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_state_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn FlowStateStore) {}
    }
}
