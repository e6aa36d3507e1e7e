use serde_json::json;
use tracing::debug;

use crate::error::UpstreamError;
use crate::models::Bunny;
use crate::store::{self, Query, Store, StoreError, TxStep};

use super::now_millis;

/// Create a bunny and return the id of the write
pub async fn create_bunny(store: &dyn Store, name: &str) -> Result<i64, StoreError> {
    let bunny_id = store::id();
    let receipt = store
        .transact(vec![TxStep::update(
            "bunnies",
            bunny_id.as_str(),
            json!({ "name": name, "createdAt": now_millis() }),
        )])
        .await?;

    debug!(tx_id = receipt.tx_id, bunny_id = %bunny_id, "bunny created");
    Ok(receipt.tx_id)
}

/// Every bunny, in whatever order the store returns them
pub async fn fetch_bunnies(store: &dyn Store) -> Result<Vec<Bunny>, UpstreamError> {
    let rows = store.query(Query::new("bunnies")).await?;
    let bunnies = rows
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<Bunny>, _>>()?;
    Ok(bunnies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_created_bunny_is_listed() {
        let store = MemoryStore::default();
        let before = now_millis();

        let tx_id = create_bunny(&store, "Thumper").await.unwrap();
        assert!(tx_id > 0);

        let bunnies = fetch_bunnies(&store).await.unwrap();
        assert_eq!(bunnies.len(), 1);
        assert_eq!(bunnies[0].name.as_deref(), Some("Thumper"));
        assert!(bunnies[0].created_at.as_ref().and_then(|n| n.as_i64()).unwrap() >= before);
    }

    #[tokio::test]
    async fn test_each_bunny_gets_its_own_id() {
        let store = MemoryStore::default();
        create_bunny(&store, "Thumper").await.unwrap();
        create_bunny(&store, "Thumper").await.unwrap();

        let bunnies = fetch_bunnies(&store).await.unwrap();
        assert_eq!(bunnies.len(), 2);
        assert_ne!(bunnies[0].id, bunnies[1].id);
    }
}
