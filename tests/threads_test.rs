mod common;

use std::sync::Arc;

use burrow::operations::{add_message_to_thread, fetch_thread_messages, AppendError};
use burrow::store::{MemoryStore, Store, TxStep};
use serde_json::json;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_parallel_appends_keep_count_consistent() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::default());
    let thread_id = common::seed_conversation(store.as_ref(), "general").await;

    let tasks: Vec<_> = ["one", "two"]
        .into_iter()
        .map(|content| {
            let store = store.clone();
            let thread_id = thread_id.clone();
            tokio::spawn(async move {
                add_message_to_thread(store.as_ref(), &thread_id, "user", content).await
            })
        })
        .collect();

    for result in futures::future::join_all(tasks).await {
        result.unwrap().unwrap();
    }

    let thread = fetch_thread_messages(store.as_ref(), &thread_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(thread.messages.len(), 2);
    assert_eq!(thread.conversation.num_messages(), json!(2));

    let last = thread.conversation.data["lastMessage"]["content"]
        .as_str()
        .unwrap();
    assert!(last == "one" || last == "two");
}

#[tokio::test]
async fn test_thread_without_data_blob_accepts_messages() {
    let store = MemoryStore::default();
    store
        .transact(vec![TxStep::update("conversations", "bare", json!({ "name": "bare" }))])
        .await
        .unwrap();

    add_message_to_thread(&store, "bare", "user", "hi").await.unwrap();

    let thread = fetch_thread_messages(&store, "bare").await.unwrap().unwrap();
    assert_eq!(thread.conversation.num_messages(), json!(1));
    assert_eq!(thread.conversation.data["lastMessage"]["role"], "user");
    assert!(thread.conversation.data["lastMessage"]["createdAt"].is_i64());
}

#[tokio::test]
async fn test_deleting_thread_removes_its_messages() {
    let store = MemoryStore::default();
    let thread_id = common::seed_conversation(&store, "general").await;
    add_message_to_thread(&store, &thread_id, "user", "hi").await.unwrap();

    store
        .transact(vec![TxStep::delete("conversations", thread_id.as_str())])
        .await
        .unwrap();

    assert!(fetch_thread_messages(&store, &thread_id).await.unwrap().is_none());
    let err = add_message_to_thread(&store, &thread_id, "user", "again")
        .await
        .unwrap_err();
    assert!(matches!(err, AppendError::NotFound(_)));

    let messages = store
        .query(burrow::store::Query::new("messages"))
        .await
        .unwrap();
    assert!(messages.is_empty());
}
