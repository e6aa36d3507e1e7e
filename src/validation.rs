//! Request body validation
//!
//! Bodies arrive as raw bytes and are checked field by field before any store
//! call is made. Every problem found is reported, each as an [`Issue`] with a
//! machine-readable code and the path of the offending field.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{CreateBunnyRequest, CreateMessageRequest};

pub const BUNNY_NAME_MAX: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    InvalidJson,
    InvalidType,
    TooSmall,
    TooBig,
}

/// One field-level violation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub code: IssueCode,
    pub path: Vec<String>,
    pub message: String,
}

impl Issue {
    pub fn new(code: IssueCode, path: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid input ({} issue(s))", issues.len())]
pub struct ValidationError {
    pub issues: Vec<Issue>,
}

impl ValidationError {
    pub fn single(issue: Issue) -> Self {
        Self {
            issues: vec![issue],
        }
    }
}

/// Inclusive length bounds, counted in Unicode scalar values
#[derive(Debug, Clone, Copy, Default)]
pub struct Length {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Length {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn between(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

/// Reads typed fields out of a JSON object, collecting issues as it goes
pub struct Fields<'a> {
    object: &'a Map<String, Value>,
    issues: Vec<Issue>,
}

impl<'a> Fields<'a> {
    fn new(object: &'a Map<String, Value>) -> Self {
        Self {
            object,
            issues: Vec::new(),
        }
    }

    /// Required string field within `bounds`
    pub fn string(&mut self, key: &str, bounds: Length) -> Option<String> {
        match self.object.get(key) {
            None => {
                self.issue(IssueCode::InvalidType, key, "Required");
                None
            }
            Some(value) => self.check_string(key, value, bounds),
        }
    }

    /// Optional string field; absent and `null` both read as `None`
    pub fn optional_string(&mut self, key: &str) -> Option<String> {
        match self.object.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => self.check_string(key, value, Length::any()),
        }
    }

    fn check_string(&mut self, key: &str, value: &Value, bounds: Length) -> Option<String> {
        let Value::String(s) = value else {
            let message = format!("Expected string, received {}", kind_of(value));
            self.issue(IssueCode::InvalidType, key, message);
            return None;
        };

        let len = s.chars().count();
        if let Some(min) = bounds.min.filter(|min| len < *min) {
            let message = format!("String must contain at least {} character(s)", min);
            self.issue(IssueCode::TooSmall, key, message);
            return None;
        }
        if let Some(max) = bounds.max.filter(|max| len > *max) {
            let message = format!("String must contain at most {} character(s)", max);
            self.issue(IssueCode::TooBig, key, message);
            return None;
        }

        Some(s.clone())
    }

    fn issue(&mut self, code: IssueCode, key: &str, message: impl Into<String>) {
        self.issues
            .push(Issue::new(code, vec![key.to_string()], message));
    }
}

/// A request body shape that can be read from a JSON object
pub trait Validate: Sized {
    /// Read the fields; `None` when any issue was recorded
    fn read(fields: &mut Fields<'_>) -> Option<Self>;
}

/// Parse raw body bytes into `T`
pub fn parse_body<T: Validate>(body: &[u8]) -> Result<T, ValidationError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        ValidationError::single(Issue::new(
            IssueCode::InvalidJson,
            Vec::new(),
            format!("Malformed JSON body: {}", e),
        ))
    })?;
    parse_value(&value)
}

/// Validate an already decoded JSON value as `T`
pub fn parse_value<T: Validate>(value: &Value) -> Result<T, ValidationError> {
    let Value::Object(object) = value else {
        return Err(ValidationError::single(Issue::new(
            IssueCode::InvalidType,
            Vec::new(),
            format!("Expected object, received {}", kind_of(value)),
        )));
    };

    let mut fields = Fields::new(object);
    let parsed = T::read(&mut fields);
    match parsed {
        Some(parsed) if fields.issues.is_empty() => Ok(parsed),
        _ => Err(ValidationError {
            issues: fields.issues,
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Validate for CreateBunnyRequest {
    fn read(fields: &mut Fields<'_>) -> Option<Self> {
        let name = fields.string("name", Length::between(1, BUNNY_NAME_MAX))?;
        Some(Self { name })
    }
}

impl Validate for CreateMessageRequest {
    fn read(fields: &mut Fields<'_>) -> Option<Self> {
        let role = fields.string("role", Length::any());
        let content = fields.string("content", Length::any());
        Some(Self {
            role: role?,
            content: content?,
        })
    }
}
