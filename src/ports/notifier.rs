//! Notifier port.
//!
//! Best-effort staff notifications when a flow completes. A failed
//! notification is logged and swallowed; it never changes the turn outcome
//! and the underlying record already exists.

use async_trait::async_trait;

use crate::domain::chat::Urgency;
use crate::domain::foundation::{OrderId, TaskId};

/// A staff-facing notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A callback task was created.
    TaskCreated {
        task_id: TaskId,
        urgency: Urgency,
        customer_name: String,
        phone: String,
    },
    /// A bulk order was confirmed.
    OrderCreated {
        order_id: OrderId,
        total_amount: u32,
        contact_name: String,
    },
}

/// Port for delivering staff notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one notification.
    async fn notify(&self, notification: &Notification) -> Result<(), NotifierError>;
}

/// Notifier errors.
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    /// Delivery channel failed.
    #[error("notification delivery failed: {0}")]
    DeliveryFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifier_is_object_safe() {
        fn _accepts_dyn(_notifier: &dyn Notifier) {}
    }
}
