// GET /ping handler

use crate::models::PingResponse;
use chrono::{SecondsFormat, Utc};
use std::convert::Infallible;

pub async fn ping_handler() -> Result<impl warp::Reply, Infallible> {
    let response = PingResponse {
        message: format!("pong from burrow {}", env!("CARGO_PKG_VERSION")),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };

    Ok(warp::reply::json(&response))
}
