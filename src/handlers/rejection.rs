// Rejection recovery: every failure becomes a JSON error body

use crate::error::ApiError;
use crate::models::ErrorBody;
use std::convert::Infallible;
use tracing::{error, warn};
use warp::http::StatusCode;
use warp::reject::{LengthRequired, MethodNotAllowed, PayloadTooLarge};
use warp::Rejection;

pub async fn handle_rejection(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (status, body) = if let Some(api_error) = err.find::<ApiError>() {
        match api_error {
            ApiError::Upstream { message, source } => error!(error = %source, "{}", message),
            ApiError::Conflict(_) => warn!(error = %api_error, "request gave up on a busy thread"),
            _ => {}
        }
        (api_error.status(), api_error.body())
    } else if err.is_not_found() || err.find::<MethodNotAllowed>().is_some() {
        (StatusCode::NOT_FOUND, ErrorBody::new("Not Found"))
    } else if err.find::<PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, ErrorBody::new("Payload Too Large"))
    } else if err.find::<LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, ErrorBody::new("Length Required"))
    } else {
        error!(rejection = ?err, "unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody::new("Internal Server Error"),
        )
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}
