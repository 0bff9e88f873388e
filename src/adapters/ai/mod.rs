//! AI adapters.
//!
//! `LlmClient` talks to an OpenAI-compatible chat completions endpoint and
//! implements both AI ports; `MockAiService` is the deterministic stand-in
//! for tests.

mod llm_client;
mod mock;

pub use llm_client::{LlmClient, LlmConfig};
pub use mock::MockAiService;
