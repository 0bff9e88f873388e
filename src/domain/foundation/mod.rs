//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that form the
//! vocabulary of the Repairline chat domain.

mod ids;
mod timestamp;
mod state_machine;
mod errors;

pub use ids::{OrderId, SessionId, TaskId};
pub use timestamp::Timestamp;
pub use state_machine::StateMachine;
pub use errors::{DomainError, ErrorCode, ValidationError};
