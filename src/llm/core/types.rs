//! Core types for the chat-completion layer

use serde::{Deserialize, Serialize};

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions placed ahead of the conversation
    System,
    /// Human input
    User,
    /// Model output
    Assistant,
}

/// A single message in a chat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Request for one assistant reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Provider model identifier, e.g. `openai/gpt-4`
    pub model: String,
    /// Conversation so far, system prompt first when there is one
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Build a request from a conversation, prepending `system` when present
    pub fn new(
        model: impl Into<String>,
        system: Option<&str>,
        conversation: impl IntoIterator<Item = ChatMessage>,
    ) -> Self {
        let messages = system
            .filter(|prompt| !prompt.is_empty())
            .map(ChatMessage::system)
            .into_iter()
            .chain(conversation)
            .collect();

        Self {
            model: model.into(),
            messages,
        }
    }
}
