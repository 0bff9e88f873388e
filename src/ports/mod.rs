//! Ports - Trait boundaries between the chat domain and the outside world.
//!
//! Each port is an `async_trait` contract the orchestrator depends on;
//! adapters provide the implementations (in-memory stores, the HTTP AI
//! client, the mock AI service for tests).

pub mod ai;
pub mod catalog;
pub mod notifier;
pub mod record_store;
pub mod session_store;
pub mod state_store;

pub use ai::{AiError, FieldExtraction, GeneratedReply, GenerativeResponder, ResponderRequest};
pub use catalog::{CatalogError, Part, PartsCatalog};
pub use notifier::{Notification, Notifier, NotifierError};
pub use record_store::{BulkOrderDraft, RecordStore, RecordStoreError, ServiceTaskDraft};
pub use session_store::SessionStore;
pub use state_store::FlowStateStore;
