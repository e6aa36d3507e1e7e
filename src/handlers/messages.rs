// POST /messages handler

use crate::error::ApiError;
use crate::models::{CreateMessageRequest, CreatedResponse};
use crate::operations;
use crate::store::Store;
use crate::validation::parse_body;
use bytes::Bytes;
use std::sync::Arc;
use warp::http::StatusCode;

pub async fn create_message_handler(
    body: Bytes,
    store: Arc<dyn Store>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let request: CreateMessageRequest = parse_body(&body).map_err(ApiError::from)?;

    let tx_id = operations::create_message(store.as_ref(), &request.role, &request.content)
        .await
        .map_err(|e| ApiError::upstream("Failed to create message", e))?;

    Ok(warp::reply::with_status(
        warp::reply::json(&CreatedResponse::new("Message created successfully", tx_id)),
        StatusCode::CREATED,
    ))
}
