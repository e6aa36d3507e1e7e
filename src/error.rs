//! Request outcome errors
//!
//! Every failure a route can produce is one [`ApiError`] variant; the
//! rejection handler maps each variant to a status code and JSON body.

use serde_json::json;
use thiserror::Error;
use warp::http::StatusCode;

use crate::llm::LlmError;
use crate::models::ErrorBody;
use crate::store::StoreError;
use crate::validation::ValidationError;

/// Failure of a collaborator outside this process
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    /// Stored data that no longer matches the expected shape
    #[error("Unexpected stored data: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Malformed request reported with a fixed message instead of issues
    #[error("Bad request: {0}")]
    BadRequest(&'static str),

    #[error("Not found: {0}")]
    NotFound(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// `message` is what the caller sees; `source` is only logged
    #[error("{message}: {source}")]
    Upstream {
        message: &'static str,
        #[source]
        source: UpstreamError,
    },
}

impl ApiError {
    pub fn upstream(message: &'static str, source: impl Into<UpstreamError>) -> Self {
        ApiError::Upstream {
            message,
            source: source.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body returned to the caller; never includes upstream causes
    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Validation(err) => {
                ErrorBody::new("Invalid input").with_details(json!(err.issues))
            }
            ApiError::BadRequest(message) | ApiError::NotFound(message) => ErrorBody::new(*message),
            ApiError::Conflict(message) => ErrorBody::new(message.clone()),
            ApiError::Upstream { message, .. } => ErrorBody::new(*message),
        }
    }
}

impl warp::reject::Reject for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{Issue, IssueCode};

    #[test]
    fn test_status_mapping() {
        let validation = ApiError::from(ValidationError::single(Issue::new(
            IssueCode::TooSmall,
            vec!["name".to_string()],
            "too short",
        )));
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("Thread not found").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("busy".to_string()).status(), StatusCode::CONFLICT);

        let upstream = ApiError::upstream(
            "Failed to fetch bunnies",
            StoreError::Pool("timed out".to_string()),
        );
        assert_eq!(upstream.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_body_carries_issues() {
        let err = ApiError::from(ValidationError::single(Issue::new(
            IssueCode::TooBig,
            vec!["name".to_string()],
            "String must contain at most 100 character(s)",
        )));
        let body = serde_json::to_value(err.body()).unwrap();

        assert_eq!(body["error"], "Invalid input");
        assert_eq!(body["details"][0]["code"], "too_big");
        assert_eq!(body["details"][0]["path"], json!(["name"]));
    }

    #[test]
    fn test_upstream_body_hides_cause() {
        let err = ApiError::upstream(
            "Failed to create bunny",
            StoreError::Database("password authentication failed".to_string()),
        );
        let body = serde_json::to_value(err.body()).unwrap();

        assert_eq!(body, json!({"error": "Failed to create bunny"}));
        assert!(err.to_string().contains("password authentication failed"));
    }
}
