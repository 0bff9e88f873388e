//! HTTP adapters - axum routes, handlers, and DTOs.

pub mod chat;
