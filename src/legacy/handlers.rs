// Legacy thread handlers

use bytes::Bytes;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::llm::{ChatMessage, ChatRequest};
use crate::validation::parse_body;

use super::models::{AddMessageRequest, CreateThreadRequest, CreateThreadResponse, Thread};
use super::{LegacyState, DEFAULT_MODEL};

const INTERNAL_ERROR: &str = "Internal Server Error";

async fn load_thread(state: &LegacyState, thread_id: &str) -> Result<Thread, ApiError> {
    let value = state
        .kv
        .get(&Thread::key(thread_id))
        .await
        .ok_or(ApiError::NotFound("Thread not found"))?;

    serde_json::from_value(value).map_err(|e| ApiError::upstream(INTERNAL_ERROR, e))
}

async fn save_thread(state: &LegacyState, thread: &Thread) -> Result<(), ApiError> {
    let value = serde_json::to_value(thread).map_err(|e| ApiError::upstream(INTERNAL_ERROR, e))?;
    state.kv.set(&Thread::key(&thread.id), value).await;
    Ok(())
}

// GET /threads/{threadId}
pub async fn get_thread_handler(
    thread_id: String,
    state: LegacyState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let thread = load_thread(&state, &thread_id).await?;
    Ok(warp::reply::json(&thread))
}

// POST /threads
pub async fn create_thread_handler(
    body: Bytes,
    state: LegacyState,
) -> Result<impl warp::Reply, warp::Rejection> {
    // A missing or unreadable body still creates a thread, just without a prompt
    let request = parse_body::<CreateThreadRequest>(&body).unwrap_or_default();

    let thread = Thread::new(Uuid::new_v4().to_string(), request.system_prompt);
    save_thread(&state, &thread).await?;
    debug!(thread_id = %thread.id, "thread created");

    Ok(warp::reply::json(&CreateThreadResponse {
        thread_id: thread.id,
    }))
}

// POST /threads/{threadId}
pub async fn add_message_handler(
    thread_id: String,
    body: Bytes,
    state: LegacyState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let mut thread = load_thread(&state, &thread_id).await?;
    let request = parse_body::<AddMessageRequest>(&body)
        .map_err(|_| ApiError::BadRequest("Invalid message format"))?;

    thread.messages.push(ChatMessage::user(request.message));

    let model = request
        .model
        .as_deref()
        .filter(|model| !model.is_empty())
        .unwrap_or(DEFAULT_MODEL);
    let chat = ChatRequest::new(
        model,
        thread.system_prompt.as_deref(),
        thread.messages.iter().cloned(),
    );
    let reply = state
        .provider
        .complete(chat)
        .await
        .map_err(|e| ApiError::upstream(INTERNAL_ERROR, e))?;
    thread.messages.push(reply);

    save_thread(&state, &thread).await?;
    debug!(thread_id = %thread.id, model, messages = thread.messages.len(), "reply added to thread");

    Ok(warp::reply::json(&thread))
}
