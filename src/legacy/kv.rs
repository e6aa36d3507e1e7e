//! Key-value store with composite keys

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &[&str]) -> Option<Value>;

    /// Insert or replace the value at `key`
    async fn set(&self, key: &[&str], value: Value);
}

/// Process-local store; contents are lost on restart
#[derive(Default)]
pub struct MemoryKv {
    entries: RwLock<HashMap<Vec<String>, Value>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

fn owned(key: &[&str]) -> Vec<String> {
    key.iter().map(|part| part.to_string()).collect()
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &[&str]) -> Option<Value> {
        self.entries.read().await.get(&owned(key)).cloned()
    }

    async fn set(&self, key: &[&str], value: Value) {
        self.entries.write().await.insert(owned(key), value);
    }
}
