//! HTTP surface for the chat turn endpoint.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{ChatAppState, SESSION_COOKIE};
pub use routes::chat_router;
