// Data structures (Bunny, Message, Conversation, request/response bodies)

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

// Stored entities
//
// Rows may be written by other clients of the store, which accepts `null` for
// any attribute and any JSON number for numeric ones, so every attribute but
// `id` is optional and timestamps keep the stored number as is.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bunny {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Number>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Number>,
}

/// Conversations are created outside this service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Number>,
    /// Free-form blob holding `lastMessage` and `numMessages`
    #[serde(default)]
    pub data: Value,
}

impl Conversation {
    /// Stored `data.numMessages`, `null` when never set
    pub fn num_messages(&self) -> Value {
        self.data.get("numMessages").cloned().unwrap_or(Value::Null)
    }
}

/// Snapshot of the newest message kept on the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    pub role: String,
    pub content: String,
    pub created_at: i64,
}

// Thread Response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadWithMessages {
    #[serde(flatten)]
    pub conversation: Conversation,
    #[serde(default)]
    pub messages: Vec<Message>,
}

// Request Types

#[derive(Debug, Clone, PartialEq)]
pub struct CreateBunnyRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateMessageRequest {
    pub role: String,
    pub content: String,
}

// Response Types

/// Body of a successful write: a message and the store transaction id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub message: String,
    pub id: i64,
}

impl CreatedResponse {
    pub fn new(message: impl Into<String>, id: i64) -> Self {
        Self {
            message: message.into(),
            id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bunny_uses_camel_case() {
        let bunny = Bunny {
            id: "b1".to_string(),
            name: Some("Thumper".to_string()),
            created_at: Some(1700000000000i64.into()),
        };
        let value = serde_json::to_value(&bunny).unwrap();
        assert_eq!(value, json!({"id": "b1", "name": "Thumper", "createdAt": 1700000000000i64}));
    }

    #[test]
    fn test_thread_flattens_conversation() {
        let value = json!({
            "id": "c1",
            "name": "general",
            "createdAt": 5,
            "data": {"numMessages": 1, "lastMessage": {"role": "user", "content": "hi", "createdAt": 6}},
            "messages": [{"id": "m1", "role": "user", "content": "hi", "createdAt": 6}]
        });

        let thread: ThreadWithMessages = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(thread.conversation.id, "c1");
        assert_eq!(thread.conversation.num_messages(), json!(1));
        assert_eq!(thread.messages.len(), 1);

        assert_eq!(serde_json::to_value(&thread).unwrap(), value);
    }

    #[test]
    fn test_conversation_tolerates_missing_attributes() {
        let thread: ThreadWithMessages = serde_json::from_value(json!({"id": "c1"})).unwrap();
        assert_eq!(thread.conversation.name, None);
        assert_eq!(thread.conversation.num_messages(), Value::Null);
        assert!(thread.messages.is_empty());
    }

    #[test]
    fn test_null_and_fractional_attributes_are_kept() {
        let value = json!({
            "id": "c1",
            "name": null,
            "createdAt": 1.5,
            "data": {},
            "messages": [{"id": "m1", "role": null, "content": "hi", "createdAt": 1700000000000.5}]
        });

        let thread: ThreadWithMessages = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(thread.conversation.name, None);
        assert_eq!(thread.messages[0].role, None);

        assert_eq!(serde_json::to_value(&thread).unwrap(), value);
    }

    #[test]
    fn test_error_body_omits_empty_details() {
        let body = serde_json::to_value(ErrorBody::new("Not Found")).unwrap();
        assert_eq!(body, json!({"error": "Not Found"}));

        let body = serde_json::to_value(ErrorBody::new("Invalid input").with_details(json!([]))).unwrap();
        assert_eq!(body["details"], json!([]));
    }
}
