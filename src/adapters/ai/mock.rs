//! Mock AI service for testing.
//!
//! Implements both AI ports with queued canned results and call tracking,
//! so tests run without a network and can script exact AI behavior per turn.
//!
//! # Example
//!
//! ```ignore
//! let ai = MockAiService::new()
//!     .with_reply("We repair ACs, fridges, and washing machines.")
//!     .with_extraction_error("provider down");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::chat::ExtractedFields;
use crate::ports::{
    AiError, FieldExtraction, GeneratedReply, GenerativeResponder, ResponderRequest,
};

type QueuedExtraction = Result<ExtractedFields, String>;
type QueuedReply = Result<GeneratedReply, String>;

/// Deterministic AI stand-in.
///
/// Queued results are consumed in order; an empty queue yields a neutral
/// default (empty extraction, a generic reply) so tests only script what
/// they assert on.
#[derive(Debug, Clone, Default)]
pub struct MockAiService {
    extractions: Arc<Mutex<VecDeque<QueuedExtraction>>>,
    replies: Arc<Mutex<VecDeque<QueuedReply>>>,
    delay: Duration,
    extraction_calls: Arc<Mutex<Vec<String>>>,
    respond_calls: Arc<Mutex<Vec<String>>>,
}

impl MockAiService {
    /// Creates a mock with empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an extraction result.
    pub fn with_extraction(self, fields: ExtractedFields) -> Self {
        self.extractions.lock().unwrap().push_back(Ok(fields));
        self
    }

    /// Queues an extraction failure.
    pub fn with_extraction_error(self, message: impl Into<String>) -> Self {
        self.extractions
            .lock()
            .unwrap()
            .push_back(Err(message.into()));
        self
    }

    /// Queues a generated reply.
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(GeneratedReply::text(text)));
        self
    }

    /// Queues a reply failure.
    pub fn with_reply_error(self, message: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Err(message.into()));
        self
    }

    /// Adds simulated latency to every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Messages passed to `extract_fields`, in order.
    pub fn extraction_calls(&self) -> Vec<String> {
        self.extraction_calls.lock().unwrap().clone()
    }

    /// Messages passed to `respond`, in order.
    pub fn respond_calls(&self) -> Vec<String> {
        self.respond_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FieldExtraction for MockAiService {
    async fn extract_fields(&self, text: &str) -> Result<ExtractedFields, AiError> {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        self.extraction_calls.lock().unwrap().push(text.to_string());

        let queued = self.extractions.lock().unwrap().pop_front();
        match queued {
            Some(Ok(fields)) => Ok(fields),
            Some(Err(message)) => Err(AiError::unavailable(message)),
            None => Ok(ExtractedFields::default()),
        }
    }
}

#[async_trait]
impl GenerativeResponder for MockAiService {
    async fn respond(&self, request: &ResponderRequest) -> Result<GeneratedReply, AiError> {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        self.respond_calls
            .lock()
            .unwrap()
            .push(request.message.clone());

        let queued = self.replies.lock().unwrap().pop_front();
        match queued {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(AiError::unavailable(message)),
            None => Ok(GeneratedReply::text(
                "Thanks for reaching out! How can we help with your appliance today?",
            )),
        }
    }
}
