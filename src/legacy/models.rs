// Legacy thread and request types

use serde::{Deserialize, Serialize};

use crate::llm::ChatMessage;
use crate::validation::{Fields, Length, Validate};

/// Stored thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl Thread {
    pub fn new(id: impl Into<String>, system_prompt: Option<String>) -> Self {
        Self {
            id: id.into(),
            system_prompt: system_prompt.filter(|prompt| !prompt.is_empty()),
            messages: Vec::new(),
        }
    }

    /// Key the thread is stored under
    pub fn key(id: &str) -> [&str; 2] {
        ["threads", id]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateThreadRequest {
    pub system_prompt: Option<String>,
}

impl Validate for CreateThreadRequest {
    fn read(fields: &mut Fields<'_>) -> Option<Self> {
        Some(Self {
            system_prompt: fields.optional_string("systemPrompt"),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddMessageRequest {
    pub message: String,
    pub model: Option<String>,
}

impl Validate for AddMessageRequest {
    fn read(fields: &mut Fields<'_>) -> Option<Self> {
        let message = fields.string(
            "message",
            Length {
                min: Some(1),
                max: None,
            },
        );
        let model = fields.optional_string("model");
        Some(Self {
            message: message?,
            model,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateThreadResponse {
    pub thread_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::parse_body;
    use serde_json::json;

    #[test]
    fn test_thread_wire_format() {
        let mut thread = Thread::new("t1", Some("Be kind.".to_string()));
        thread.messages.push(ChatMessage::user("hi"));

        assert_eq!(
            serde_json::to_value(&thread).unwrap(),
            json!({
                "id": "t1",
                "systemPrompt": "Be kind.",
                "messages": [{"role": "user", "content": "hi"}]
            })
        );
    }

    #[test]
    fn test_empty_system_prompt_is_dropped() {
        let thread = Thread::new("t1", Some(String::new()));
        assert_eq!(serde_json::to_value(&thread).unwrap(), json!({"id": "t1", "messages": []}));
    }

    #[test]
    fn test_add_message_request() {
        let request: AddMessageRequest =
            parse_body(br#"{"message": "hi", "model": "openai/gpt-4o"}"#).unwrap();
        assert_eq!(request.model.as_deref(), Some("openai/gpt-4o"));

        assert!(parse_body::<AddMessageRequest>(br#"{"message": ""}"#).is_err());
        assert!(parse_body::<AddMessageRequest>(br#"{"message": 42}"#).is_err());
        assert!(parse_body::<AddMessageRequest>(br#"{"text": "hi"}"#).is_err());
    }
}
