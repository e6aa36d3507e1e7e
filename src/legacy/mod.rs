//! Legacy chat service
//!
//! Threads live in a key-value store and every user message is answered by a
//! chat-completion provider. Served by the `burrow-legacy` binary.

pub mod handlers;
pub mod kv;
pub mod models;
pub mod routes;

use std::sync::Arc;

use crate::llm::ChatProvider;

pub use kv::{KvStore, MemoryKv};
pub use routes::configure_routes;

/// Model used when a request does not name one
pub const DEFAULT_MODEL: &str = "openai/gpt-4";

/// Collaborators shared by every legacy handler
#[derive(Clone)]
pub struct LegacyState {
    pub kv: Arc<dyn KvStore>,
    pub provider: Arc<dyn ChatProvider>,
}

impl LegacyState {
    pub fn new(kv: Arc<dyn KvStore>, provider: Arc<dyn ChatProvider>) -> Self {
        Self { kv, provider }
    }
}
