//! Domain layer.

pub mod chat;
pub mod foundation;
