// Route definitions

use crate::handlers;
use crate::store::Store;
use bytes::Bytes;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::info;
use warp::Filter;

/// Largest request body accepted, in bytes
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Build the full API; every rejection is recovered into a JSON error body
pub fn configure_routes(
    store: Arc<dyn Store>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    // GET /ping
    let ping = warp::path("ping")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handlers::ping_handler);

    // GET /bunnies
    let list_bunnies = warp::path("bunnies")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_store(store.clone()))
        .and_then(handlers::list_bunnies_handler);

    // POST /bunnies
    let create_bunny = warp::path("bunnies")
        .and(warp::path::end())
        .and(warp::post())
        .and(request_body())
        .and(with_store(store.clone()))
        .and_then(handlers::create_bunny_handler);

    // POST /messages
    let create_message = warp::path("messages")
        .and(warp::path::end())
        .and(warp::post())
        .and(request_body())
        .and(with_store(store.clone()))
        .and_then(handlers::create_message_handler);

    // GET /threads/{threadId}
    let get_thread = warp::path("threads")
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_store(store.clone()))
        .and_then(handlers::get_thread_handler);

    // POST /threads/{threadId}
    let add_message = warp::path("threads")
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::post())
        .and(request_body())
        .and(with_store(store))
        .and_then(handlers::add_message_handler);

    // Combine routes
    ping.or(list_bunnies)
        .or(create_bunny)
        .or(create_message)
        .or(get_thread)
        .or(add_message)
        .recover(handlers::handle_rejection)
        .with(warp::log::custom(log_request))
}

/// Raw request body, capped at [`MAX_BODY_BYTES`]
///
/// A request with neither `Content-Length` nor `Transfer-Encoding` carries no
/// body and reads as empty. A chunked body without a length is refused.
pub fn request_body() -> impl Filter<Extract = (Bytes,), Error = warp::Rejection> + Clone {
    let sized = warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::bytes());
    let absent = warp::header::optional::<u64>("content-length")
        .and(warp::header::optional::<String>("transfer-encoding"))
        .and_then(|length: Option<u64>, encoding: Option<String>| async move {
            match (length, encoding) {
                (None, None) => Ok(Bytes::new()),
                _ => Err(warp::reject()),
            }
        });
    sized.or(absent).unify()
}

/// Inject a clone of the shared store into a handler
pub fn with_store(
    store: Arc<dyn Store>,
) -> impl Filter<Extract = (Arc<dyn Store>,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}

/// One tracing event per request
pub(crate) fn log_request(info: warp::log::Info<'_>) {
    info!(
        method = %info.method(),
        path = info.path(),
        status = info.status().as_u16(),
        elapsed_ms = info.elapsed().as_millis() as u64,
        "request"
    );
}
