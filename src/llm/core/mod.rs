//! Core abstractions for the chat-completion layer

pub mod error;
pub mod provider;
pub mod types;
