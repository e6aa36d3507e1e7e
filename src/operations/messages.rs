use serde_json::json;
use tracing::debug;

use crate::store::{self, Store, StoreError, TxStep};

use super::now_millis;

/// Create a message that belongs to no conversation
pub async fn create_message(store: &dyn Store, role: &str, content: &str) -> Result<i64, StoreError> {
    let receipt = store
        .transact(vec![TxStep::update(
            "messages",
            store::id(),
            json!({ "role": role, "content": content, "createdAt": now_millis() }),
        )])
        .await?;

    debug!(tx_id = receipt.tx_id, "message created");
    Ok(receipt.tx_id)
}
