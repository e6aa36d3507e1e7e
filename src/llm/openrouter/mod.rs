//! OpenRouter provider implementation
//!
//! OpenRouter exposes many hosted models behind the OpenAI chat-completions
//! wire format.

pub mod client;
pub mod mapper;
pub mod types;

pub use client::{OpenRouterClient, OpenRouterConfig, DEFAULT_BASE_URL};
