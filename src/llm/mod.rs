//! Chat-completion layer
//!
//! A provider-neutral request/reply model behind [`ChatProvider`], with an
//! OpenRouter client speaking the OpenAI-compatible completions API.

pub mod core;
pub mod openrouter;

pub use core::{
    error::LlmError,
    provider::ChatProvider,
    types::{ChatMessage, ChatRequest, Role},
};

pub use openrouter::{OpenRouterClient, OpenRouterConfig};
