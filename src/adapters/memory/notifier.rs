//! In-memory notifier.
//!
//! Collects notifications instead of delivering them. The production
//! deployment logs them; a real channel (WhatsApp, SMS) would slot in behind
//! the same port.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{Notification, Notifier, NotifierError};

/// Notifications held in memory, with failure injection for tests.
#[derive(Debug, Default)]
pub struct InMemoryNotifier {
    sent: Arc<RwLock<Vec<Notification>>>,
    failing: AtomicBool,
}

impl InMemoryNotifier {
    /// Creates an empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent delivery fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delivered notifications, oldest first.
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifierError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifierError::DeliveryFailed(
                "injected failure".to_string(),
            ));
        }
        tracing::info!(?notification, "staff notification");
        self.sent.write().await.push(notification.clone());
        Ok(())
    }
}
