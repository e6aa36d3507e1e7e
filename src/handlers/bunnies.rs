// GET /bunnies and POST /bunnies handlers

use crate::error::ApiError;
use crate::models::{CreateBunnyRequest, CreatedResponse};
use crate::operations;
use crate::store::Store;
use crate::validation::parse_body;
use bytes::Bytes;
use std::sync::Arc;
use warp::http::StatusCode;

pub async fn list_bunnies_handler(store: Arc<dyn Store>) -> Result<impl warp::Reply, warp::Rejection> {
    let bunnies = operations::fetch_bunnies(store.as_ref())
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch bunnies", e))?;

    Ok(warp::reply::json(&bunnies))
}

pub async fn create_bunny_handler(
    body: Bytes,
    store: Arc<dyn Store>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let request: CreateBunnyRequest = parse_body(&body).map_err(ApiError::from)?;

    let tx_id = operations::create_bunny(store.as_ref(), &request.name)
        .await
        .map_err(|e| ApiError::upstream("Failed to create bunny", e))?;

    Ok(warp::reply::with_status(
        warp::reply::json(&CreatedResponse::new("Bunny created successfully", tx_id)),
        StatusCode::CREATED,
    ))
}
