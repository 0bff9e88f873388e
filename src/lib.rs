//! Repairline - Conversational support-chat backend
//!
//! Turn-based dialogue orchestration for a local home-appliance repair
//! business: failed-call callback collection, bulk spare-parts ordering,
//! and AI-assisted general support, behind one chat endpoint.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
