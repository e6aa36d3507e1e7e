//! Conversation ("thread") reads and the append flow
//!
//! Appending is a read followed by one atomic batch. The batch starts with a
//! `Check` on the `numMessages` value that was read, so a concurrent append
//! that lands in between makes the batch fail with a conflict instead of
//! silently overwriting the counter. The read is then repeated.

use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::UpstreamError;
use crate::models::{LastMessage, ThreadWithMessages};
use crate::store::{self, Query, Store, StoreError, TxStep};

use super::now_millis;

/// Attempts made before an append gives up on a busy thread
pub const MAX_APPEND_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum AppendError {
    #[error("thread {0} not found")]
    NotFound(String),

    #[error("thread {thread_id} changed on each of {attempts} attempts")]
    Conflict { thread_id: String, attempts: u32 },

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl From<StoreError> for AppendError {
    fn from(err: StoreError) -> Self {
        AppendError::Upstream(err.into())
    }
}

/// The conversation with its linked messages, or `None` if it does not exist
pub async fn fetch_thread_messages(
    store: &dyn Store,
    thread_id: &str,
) -> Result<Option<ThreadWithMessages>, UpstreamError> {
    let rows = store
        .query(
            Query::new("conversations")
                .with_id(thread_id)
                .including("messages"),
        )
        .await?;

    match rows.into_iter().next() {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

/// Append a message to a conversation and update its summary fields
///
/// Returns the id of the batch that created the message.
pub async fn add_message_to_thread(
    store: &dyn Store,
    thread_id: &str,
    role: &str,
    content: &str,
) -> Result<i64, AppendError> {
    for attempt in 1..=MAX_APPEND_ATTEMPTS {
        let thread = fetch_thread_messages(store, thread_id)
            .await?
            .ok_or_else(|| AppendError::NotFound(thread_id.to_string()))?;

        let num_messages = thread.messages.len() + 1;
        let message_id = store::id();
        let last_message = LastMessage {
            role: role.to_string(),
            content: content.to_string(),
            created_at: now_millis(),
        };

        let steps = vec![
            TxStep::check(
                "conversations",
                thread_id,
                &["data", "numMessages"],
                thread.conversation.num_messages(),
            ),
            TxStep::merge(
                "conversations",
                thread_id,
                json!({ "data": { "lastMessage": &last_message, "numMessages": num_messages } }),
            ),
            TxStep::update(
                "messages",
                message_id.as_str(),
                json!({ "role": role, "content": content, "createdAt": last_message.created_at }),
            ),
            TxStep::link("conversations", thread_id, "messages", message_id.as_str()),
        ];

        match store.transact(steps).await {
            Ok(receipt) => {
                debug!(
                    tx_id = receipt.tx_id,
                    thread_id,
                    message_id = %message_id,
                    num_messages,
                    "message appended to thread"
                );
                return Ok(receipt.tx_id);
            }
            Err(err) if err.is_conflict() => {
                warn!(thread_id, attempt, "thread changed during append, retrying");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(AppendError::Conflict {
        thread_id: thread_id.to_string(),
        attempts: MAX_APPEND_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Result as StoreResult, TxReceipt};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicU32, Ordering};

    async fn with_conversation(data: Value) -> MemoryStore {
        let store = MemoryStore::default();
        store
            .transact(vec![TxStep::update(
                "conversations",
                "c1",
                json!({ "name": "general", "createdAt": 1, "data": data }),
            )])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_missing_thread_reads_as_none() {
        let store = MemoryStore::default();
        assert!(fetch_thread_messages(&store, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_thread_has_no_messages() {
        let store = with_conversation(Value::Null).await;
        let thread = fetch_thread_messages(&store, "c1").await.unwrap().unwrap();
        assert_eq!(thread.conversation.name.as_deref(), Some("general"));
        assert!(thread.messages.is_empty());
    }

    #[tokio::test]
    async fn test_append_updates_counter_and_last_message() {
        let store = with_conversation(json!({})).await;

        add_message_to_thread(&store, "c1", "user", "first").await.unwrap();
        let thread = fetch_thread_messages(&store, "c1").await.unwrap().unwrap();
        assert_eq!(thread.conversation.num_messages(), json!(1));
        assert_eq!(thread.messages.len(), 1);

        add_message_to_thread(&store, "c1", "assistant", "second").await.unwrap();
        let thread = fetch_thread_messages(&store, "c1").await.unwrap().unwrap();
        assert_eq!(thread.conversation.num_messages(), json!(2));
        assert_eq!(thread.conversation.data["lastMessage"]["content"], "second");
        assert_eq!(thread.conversation.data["lastMessage"]["role"], "assistant");
        let contents: Vec<_> = thread.messages.iter().map(|m| m.content.as_deref()).collect();
        assert_eq!(contents, vec![Some("first"), Some("second")]);
    }

    #[tokio::test]
    async fn test_append_keeps_other_data_keys() {
        let store = with_conversation(json!({ "topic": "carrots" })).await;
        add_message_to_thread(&store, "c1", "user", "hi").await.unwrap();

        let thread = fetch_thread_messages(&store, "c1").await.unwrap().unwrap();
        assert_eq!(thread.conversation.data["topic"], "carrots");
    }

    #[tokio::test]
    async fn test_append_to_missing_thread_is_not_found() {
        let store = MemoryStore::default();
        let err = add_message_to_thread(&store, "nope", "user", "hi").await.unwrap_err();
        assert!(matches!(err, AppendError::NotFound(id) if id == "nope"));

        let messages = store.query(Query::new("messages")).await.unwrap();
        assert!(messages.is_empty());
    }

    /// Lands a competing append right before each of the first `races` batches
    struct Racing {
        inner: MemoryStore,
        races: AtomicU32,
    }

    #[async_trait]
    impl Store for Racing {
        async fn query(&self, query: Query) -> StoreResult<Vec<Value>> {
            self.inner.query(query).await
        }

        async fn transact(&self, steps: Vec<TxStep>) -> StoreResult<TxReceipt> {
            let racing = self
                .races
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if racing {
                add_message_to_thread(&self.inner, "c1", "user", "rival")
                    .await
                    .unwrap();
            }
            self.inner.transact(steps).await
        }
    }

    #[tokio::test]
    async fn test_conflicting_append_retries() {
        let store = Racing {
            inner: with_conversation(json!({})).await,
            races: AtomicU32::new(1),
        };

        add_message_to_thread(&store, "c1", "user", "mine").await.unwrap();

        let thread = fetch_thread_messages(&store, "c1").await.unwrap().unwrap();
        assert_eq!(thread.messages.len(), 2);
        assert_eq!(thread.conversation.num_messages(), json!(2));
        assert_eq!(thread.conversation.data["lastMessage"]["content"], "mine");
    }

    #[tokio::test]
    async fn test_append_gives_up_after_max_attempts() {
        let store = Racing {
            inner: with_conversation(json!({})).await,
            races: AtomicU32::new(MAX_APPEND_ATTEMPTS),
        };

        let err = add_message_to_thread(&store, "c1", "user", "mine").await.unwrap_err();
        assert!(matches!(
            err,
            AppendError::Conflict { attempts, .. } if attempts == MAX_APPEND_ATTEMPTS
        ));

        let thread = fetch_thread_messages(&store, "c1").await.unwrap().unwrap();
        assert_eq!(thread.messages.len(), MAX_APPEND_ATTEMPTS as usize);
        assert!(thread.messages.iter().all(|m| m.content.as_deref() == Some("rival")));
    }
}
