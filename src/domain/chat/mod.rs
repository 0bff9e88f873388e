//! Chat domain - the conversational core.
//!
//! Sessions, messages, customer records, field extraction, intent
//! classification, the two conversation flows (callback collection and bulk
//! ordering), response enhancement, and the orchestrator that sequences one
//! turn end to end.

pub mod bulk_order;
pub mod callback_flow;
pub mod customer;
pub mod enhancer;
pub mod extractor;
pub mod intent;
pub mod message;
pub mod orchestrator;
pub mod session;

pub use bulk_order::{
    BulkOrderFlow, BulkOrderOutcome, BulkOrderState, BulkOrderStep, OrderContact, OrderLine,
    BULK_PRICE_MIN_QUANTITY, MAX_ORDER_QUANTITY,
};
pub use callback_flow::{CallbackFlow, CallbackOutcome, CallbackStage, CallbackState};
pub use customer::{CustomerRecord, RequiredField};
pub use enhancer::{BusinessContact, EnhancedResponse, ResponseAction, ResponseEnhancer};
pub use extractor::{
    sanitize_message, ExtractedField, ExtractedFields, RuleBasedExtractor, TieredExtractor,
    MAX_MESSAGE_LENGTH, MIN_AI_CONFIDENCE,
};
pub use intent::{
    BulkOrderDetector, FailedCallDetector, FailedCallSignal, IntentCategory, Urgency,
};
pub use message::{Message, MessageId, MessageKind, MessageMeta, Sender};
pub use orchestrator::{
    ChatOrchestrator, Collaborators, OrchestratorSettings, TurnRequest, TurnResponse,
};
pub use session::Session;
