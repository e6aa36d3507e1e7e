//! Mapping between chat-layer types and the OpenRouter wire format

use std::time::Duration;

use crate::llm::core::{
    error::LlmError,
    types::{ChatMessage, ChatRequest, Role},
};

use super::types::{CompletionMessage, CompletionRequest, CompletionResponse, ErrorResponse};

/// Reply used when the model returns no text
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't generate a response.";

/// Convert our request to the completions request body
pub fn to_completion_request(request: ChatRequest) -> Result<CompletionRequest, LlmError> {
    if request.messages.is_empty() {
        return Err(LlmError::InvalidRequest(
            "at least one message is required".to_string(),
        ));
    }

    Ok(CompletionRequest {
        model: request.model,
        messages: request
            .messages
            .into_iter()
            .map(|message| CompletionMessage {
                role: role_name(message.role).to_string(),
                content: Some(message.content),
            })
            .collect(),
    })
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

/// Take the first choice as the assistant reply
///
/// Missing or empty content becomes [`FALLBACK_REPLY`].
pub fn from_completion_response(response: CompletionResponse) -> Result<ChatMessage, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("completion has no choices".to_string()))?;

    let content = choice
        .message
        .content
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| FALLBACK_REPLY.to_string());

    Ok(ChatMessage::assistant(content))
}

/// Map a non-success status and body to an error
pub fn error_for_status(status: u16, retry_after: Option<&str>, body: String) -> LlmError {
    match status {
        401 | 403 => LlmError::AuthenticationError(provider_message(&body).unwrap_or(body)),
        429 => LlmError::RateLimitExceeded {
            retry_after: retry_after
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
        },
        _ => match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(envelope) => LlmError::ProviderError {
                code: envelope
                    .error
                    .code
                    .map(|code| match code {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .unwrap_or_else(|| status.to_string()),
                message: envelope.error.message,
            },
            Err(_) => LlmError::HttpError { status, body },
        },
    }
}

fn provider_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|envelope| envelope.error.message)
}
