// GET /threads/{threadId} and POST /threads/{threadId} handlers

use crate::error::ApiError;
use crate::models::{CreateMessageRequest, CreatedResponse};
use crate::operations::{self, AppendError};
use crate::store::Store;
use crate::validation::parse_body;
use bytes::Bytes;
use std::sync::Arc;
use warp::http::StatusCode;

/// Replies `null` for an unknown thread
pub async fn get_thread_handler(
    thread_id: String,
    store: Arc<dyn Store>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let thread = operations::fetch_thread_messages(store.as_ref(), &thread_id)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch thread", e))?;

    Ok(warp::reply::json(&thread))
}

pub async fn add_message_handler(
    thread_id: String,
    body: Bytes,
    store: Arc<dyn Store>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let request: CreateMessageRequest = parse_body(&body).map_err(ApiError::from)?;

    let tx_id = operations::add_message_to_thread(
        store.as_ref(),
        &thread_id,
        &request.role,
        &request.content,
    )
    .await
    .map_err(|err| match err {
        AppendError::NotFound(_) => ApiError::NotFound("Thread not found"),
        AppendError::Conflict { .. } => {
            ApiError::Conflict("Thread was modified concurrently, try again".to_string())
        }
        AppendError::Upstream(source) => ApiError::upstream("Failed to add message to thread", source),
    })?;

    Ok(warp::reply::with_status(
        warp::reply::json(&CreatedResponse::new("Message added to thread", tx_id)),
        StatusCode::CREATED,
    ))
}
