//! In-memory flow state store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::chat::{BulkOrderState, CallbackState};
use crate::domain::foundation::{DomainError, SessionId};
use crate::ports::FlowStateStore;

/// Flow states in two `RwLock`ed maps, one per flow kind.
///
/// Deliberately separate from the session map: flow states live on their
/// own 30-minute clock and must survive a lost session entry.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    callbacks: Arc<RwLock<HashMap<SessionId, CallbackState>>>,
    bulk_orders: Arc<RwLock<HashMap<SessionId, BulkOrderState>>>,
}

impl InMemoryStateStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlowStateStore for InMemoryStateStore {
    async fn set_callback(
        &self,
        session: &SessionId,
        state: CallbackState,
    ) -> Result<(), DomainError> {
        self.callbacks.write().await.insert(*session, state);
        Ok(())
    }

    async fn get_callback(
        &self,
        session: &SessionId,
    ) -> Result<Option<CallbackState>, DomainError> {
        Ok(self.callbacks.read().await.get(session).cloned())
    }

    async fn clear_callback(&self, session: &SessionId) -> Result<(), DomainError> {
        self.callbacks.write().await.remove(session);
        Ok(())
    }

    async fn set_bulk_order(
        &self,
        session: &SessionId,
        state: BulkOrderState,
    ) -> Result<(), DomainError> {
        self.bulk_orders.write().await.insert(*session, state);
        Ok(())
    }

    async fn get_bulk_order(
        &self,
        session: &SessionId,
    ) -> Result<Option<BulkOrderState>, DomainError> {
        Ok(self.bulk_orders.read().await.get(session).cloned())
    }

    async fn clear_bulk_order(&self, session: &SessionId) -> Result<(), DomainError> {
        self.bulk_orders.write().await.remove(session);
        Ok(())
    }

    async fn sweep_expired(&self, max_age_secs: u64) -> Result<usize, DomainError> {
        let mut removed = 0;

        let mut callbacks = self.callbacks.write().await;
        let before = callbacks.len();
        callbacks.retain(|_, state| !state.is_expired(max_age_secs));
        removed += before - callbacks.len();
        drop(callbacks);

        let mut bulk_orders = self.bulk_orders.write().await;
        let before = bulk_orders.len();
        bulk_orders.retain(|_, state| !state.is_expired(max_age_secs));
        removed += before - bulk_orders.len();

        Ok(removed)
    }
}
