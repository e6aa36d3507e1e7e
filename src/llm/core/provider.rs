//! Provider trait for chat-completion implementations

use async_trait::async_trait;

use super::{
    error::LlmError,
    types::{ChatMessage, ChatRequest},
};

/// Interface every chat-completion provider implements
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Ask the model for the next assistant message
    ///
    /// # Arguments
    /// * `request` - Model identifier and the conversation so far
    ///
    /// # Returns
    /// The assistant reply, or an error if the provider call fails
    async fn complete(&self, request: ChatRequest) -> Result<ChatMessage, LlmError>;
}
