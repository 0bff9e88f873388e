//! In-memory adapters.
//!
//! Backing for tests and single-node deployments: `tokio::sync::RwLock`
//! maps with TTL sweeps driven by background intervals the binary spawns.
//! Not suitable for multi-server deployments.

mod catalog;
mod notifier;
mod record_store;
mod session_store;
mod state_store;

pub use catalog::InMemoryCatalog;
pub use notifier::InMemoryNotifier;
pub use record_store::InMemoryRecordStore;
pub use session_store::InMemorySessionStore;
pub use state_store::InMemoryStateStore;
