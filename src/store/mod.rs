//! Document/graph store client
//!
//! Entities are JSON objects grouped by namespace and linked to each other
//! through links declared in the [`Schema`]. The [`Store`] trait is the whole
//! client surface: a declarative `query`, an atomic `transact`, and `close`.
//!
//! # Quick Start
//!
//! ```
//! use burrow::store::{MemoryStore, Query, Store, TxStep};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::default();
//!
//!     store
//!         .transact(vec![TxStep::update("bunnies", burrow::store::id(), json!({"name": "Thumper"}))])
//!         .await?;
//!
//!     let bunnies = store.query(Query::new("bunnies")).await?;
//!     assert_eq!(bunnies.len(), 1);
//!     Ok(())
//! }
//! ```

pub mod attrs;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod schema;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::{PgStore, PgStoreConfig};
pub use schema::Schema;
pub use types::{Query, TxReceipt, TxStep};

/// Client interface shared by every store backend
#[async_trait]
pub trait Store: Send + Sync {
    /// Entities matching `query`, each a JSON object with its `id`
    async fn query(&self, query: Query) -> Result<Vec<Value>>;

    /// Apply every step atomically; nothing is written if any step fails
    async fn transact(&self, steps: Vec<TxStep>) -> Result<TxReceipt>;

    /// Release connections before shutdown
    async fn close(&self) {}
}

/// Fresh globally unique entity identifier
pub fn id() -> String {
    Uuid::new_v4().to_string()
}

/// Which backend to build at startup
#[derive(Debug, Clone)]
pub enum StoreBackend {
    Postgres(PgStoreConfig),
    Memory,
}

/// Build the configured store backend for `app_id`
pub async fn connect(app_id: &str, backend: &StoreBackend) -> Result<Arc<dyn Store>> {
    match backend {
        StoreBackend::Postgres(config) => {
            let store = PgStore::connect(config.clone(), app_id, Schema::app()).await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new(Schema::app()))),
    }
}
