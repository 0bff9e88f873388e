//! Record store port.
//!
//! Creates the durable business records the flows complete into: callback
//! service tasks and bulk orders. Creation is the exactly-once side effect
//! of a flow completion; the orchestrator invokes it once and never retries
//! inside the turn.

use async_trait::async_trait;

use crate::domain::chat::{CustomerRecord, OrderContact, OrderLine, Urgency};
use crate::domain::foundation::{OrderId, TaskId};

/// A callback service task ready to be recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceTaskDraft {
    pub customer: CustomerRecord,
    pub urgency: Urgency,
    /// The message that triggered failed-call detection.
    pub trigger_message: String,
}

/// A confirmed bulk order ready to be recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkOrderDraft {
    pub lines: Vec<OrderLine>,
    pub contact: OrderContact,
    pub pickup_location: String,
    /// Order total in whole rupees.
    pub total_amount: u32,
}

/// Port for creating business records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Records a callback task.
    ///
    /// # Errors
    ///
    /// Storage failure. The caller clears the flow state and falls back to
    /// a direct-contact reply; it does not retry.
    async fn create_service_task(&self, draft: &ServiceTaskDraft)
        -> Result<TaskId, RecordStoreError>;

    /// Records a confirmed bulk order.
    async fn create_bulk_order(&self, draft: &BulkOrderDraft) -> Result<OrderId, RecordStoreError>;
}

/// Record store errors.
#[derive(Debug, thiserror::Error)]
pub enum RecordStoreError {
    /// Backing store unreachable or rejected the write.
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// Draft failed the store's own validation.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn RecordStore) {}
    }
}
