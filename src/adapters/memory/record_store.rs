//! In-memory record store.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{OrderId, TaskId};
use crate::ports::{BulkOrderDraft, RecordStore, RecordStoreError, ServiceTaskDraft};

/// Records held in memory, with failure injection for tests.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    tasks: Arc<RwLock<Vec<(TaskId, ServiceTaskDraft)>>>,
    orders: Arc<RwLock<Vec<(OrderId, BulkOrderDraft)>>>,
    failing: AtomicBool,
}

impl InMemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Recorded service tasks, oldest first.
    pub async fn tasks(&self) -> Vec<(TaskId, ServiceTaskDraft)> {
        self.tasks.read().await.clone()
    }

    /// Recorded bulk orders, oldest first.
    pub async fn orders(&self) -> Vec<(OrderId, BulkOrderDraft)> {
        self.orders.read().await.clone()
    }

    fn check_failing(&self) -> Result<(), RecordStoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RecordStoreError::Unavailable(
                "injected failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create_service_task(
        &self,
        draft: &ServiceTaskDraft,
    ) -> Result<TaskId, RecordStoreError> {
        self.check_failing()?;
        let id = TaskId::new();
        self.tasks.write().await.push((id, draft.clone()));
        Ok(id)
    }

    async fn create_bulk_order(&self, draft: &BulkOrderDraft) -> Result<OrderId, RecordStoreError> {
        self.check_failing()?;
        let id = OrderId::new();
        self.orders.write().await.push((id, draft.clone()));
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::{CustomerRecord, OrderContact, Urgency};

    fn task_draft() -> ServiceTaskDraft {
        ServiceTaskDraft {
            customer: CustomerRecord {
                name: Some("Ravi".to_string()),
                phone: Some("9876543210".to_string()),
                location: Some("Thiruvalla".to_string()),
                problem: None,
            },
            urgency: Urgency::Medium,
            trigger_message: "tried calling, no response".to_string(),
        }
    }

    fn order_draft() -> BulkOrderDraft {
        BulkOrderDraft {
            lines: Vec::new(),
            contact: OrderContact::default(),
            pickup_location: "MC Road, Thiruvalla".to_string(),
            total_amount: 4000,
        }
    }

    #[tokio::test]
    async fn records_service_task() {
        let store = InMemoryRecordStore::new();
        let id = store.create_service_task(&task_draft()).await.unwrap();

        let tasks = store.tasks().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].0, id);
    }

    #[tokio::test]
    async fn records_bulk_order() {
        let store = InMemoryRecordStore::new();
        let id = store.create_bulk_order(&order_draft()).await.unwrap();

        let orders = store.orders().await;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].0, id);
    }

    #[tokio::test]
    async fn injected_failure_rejects_writes() {
        let store = InMemoryRecordStore::new();
        store.set_failing(true);
        assert!(store.create_service_task(&task_draft()).await.is_err());
        assert!(store.tasks().await.is_empty());

        store.set_failing(false);
        assert!(store.create_service_task(&task_draft()).await.is_ok());
    }
}
