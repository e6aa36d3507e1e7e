// Legacy route definitions

use std::convert::Infallible;

use warp::Filter;

use crate::handlers::handle_rejection;
use crate::routes::{log_request, request_body};

use super::{handlers, LegacyState};

pub fn configure_routes(
    state: LegacyState,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    // GET /threads/{threadId}
    let get_thread = warp::path("threads")
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::get_thread_handler);

    // POST /threads
    let create_thread = warp::path("threads")
        .and(warp::path::end())
        .and(warp::post())
        .and(request_body())
        .and(with_state(state.clone()))
        .and_then(handlers::create_thread_handler);

    // POST /threads/{threadId}
    let add_message = warp::path("threads")
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::post())
        .and(request_body())
        .and(with_state(state))
        .and_then(handlers::add_message_handler);

    get_thread
        .or(create_thread)
        .or(add_message)
        .recover(handle_rejection)
        .with(warp::log::custom(log_request))
}

fn with_state(
    state: LegacyState,
) -> impl Filter<Extract = (LegacyState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}
