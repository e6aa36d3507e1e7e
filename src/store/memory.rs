//! In-process store backend
//!
//! Keeps every entity and link in memory. A batch is applied to a copy of the
//! state which replaces the live state only once every step succeeded, so
//! readers never see half of a batch.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::store::{
    attrs::{apply_merge, apply_update, entity_json, value_at_path},
    error::{Result, StoreError},
    schema::{Cardinality, LinkPath, Schema},
    types::{Query, TxReceipt, TxStep},
    Store,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct LinkRow {
    link: String,
    owner: String,
    member: String,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    entities: BTreeMap<(String, String), Map<String, Value>>,
    links: Vec<LinkRow>,
    last_tx_id: i64,
}

impl MemoryState {
    fn get(&self, namespace: &str, id: &str) -> Option<&Map<String, Value>> {
        self.entities.get(&(namespace.to_string(), id.to_string()))
    }

    fn entry(&mut self, namespace: &str, id: &str) -> &mut Map<String, Value> {
        self.entities
            .entry((namespace.to_string(), id.to_string()))
            .or_default()
    }

    fn apply(&mut self, schema: &Schema, step: TxStep) -> Result<()> {
        match step {
            TxStep::Update {
                namespace,
                id,
                attrs,
            } => {
                schema.check_attrs(&namespace, &attrs)?;
                apply_update(self.entry(&namespace, &id), attrs);
            }
            TxStep::Merge {
                namespace,
                id,
                attrs,
            } => {
                schema.check_attrs(&namespace, &attrs)?;
                apply_merge(self.entry(&namespace, &id), attrs);
            }
            TxStep::Link {
                namespace,
                id,
                label,
                target,
            } => {
                let path = schema.link(&namespace, &label)?;
                self.require(&namespace, &id)?;
                self.require(path.target_namespace(), &target)?;
                self.link(path, &id, &target);
            }
            TxStep::Delete { namespace, id } => {
                schema.entity(&namespace)?;
                self.delete(schema, &namespace, &id);
            }
            TxStep::Check {
                namespace,
                id,
                path,
                expected,
            } => {
                let actual = self
                    .get(&namespace, &id)
                    .map(|attrs| value_at_path(attrs, &path))
                    .unwrap_or(Value::Null);
                if self.get(&namespace, &id).is_none() || actual != expected {
                    return Err(StoreError::Conflict {
                        namespace,
                        id,
                        expected,
                        actual,
                    });
                }
            }
        }
        Ok(())
    }

    fn require(&self, namespace: &str, id: &str) -> Result<()> {
        match self.get(namespace, id) {
            Some(_) => Ok(()),
            None => Err(StoreError::MissingEntity {
                namespace: namespace.to_string(),
                id: id.to_string(),
            }),
        }
    }

    fn link(&mut self, path: LinkPath<'_>, source: &str, target: &str) {
        let (owner, member) = path.owner_member(source, target);
        let def = path.def;

        if def.reverse.has == Cardinality::One {
            self.links
                .retain(|row| !(row.link == def.name && row.member == member));
        }
        if def.forward.has == Cardinality::One {
            self.links
                .retain(|row| !(row.link == def.name && row.owner == owner));
        }

        let row = LinkRow {
            link: def.name.to_string(),
            owner: owner.to_string(),
            member: member.to_string(),
        };
        if !self.links.contains(&row) {
            self.links.push(row);
        }
    }

    fn delete(&mut self, schema: &Schema, namespace: &str, id: &str) {
        let mut pending = vec![(namespace.to_string(), id.to_string())];

        while let Some((namespace, id)) = pending.pop() {
            if self.entities.remove(&(namespace.clone(), id.clone())).is_none() {
                continue;
            }

            for def in schema.cascades_from(&namespace) {
                pending.extend(
                    self.links
                        .iter()
                        .filter(|row| row.link == def.name && row.owner == id)
                        .map(|row| (def.reverse.namespace.to_string(), row.member.clone())),
                );
            }

            for def in schema.links_of(&namespace) {
                let as_owner = def.forward.namespace == namespace;
                let as_member = def.reverse.namespace == namespace;
                self.links.retain(|row| {
                    !(row.link == def.name
                        && ((as_owner && row.owner == id) || (as_member && row.member == id)))
                });
            }
        }
    }

    fn linked(&self, path: LinkPath<'_>, id: &str) -> Vec<Value> {
        let target_namespace = path.target_namespace();

        self.links
            .iter()
            .filter(|row| row.link == path.def.name)
            .filter_map(|row| {
                let target = if path.from_owner {
                    (row.owner == id).then_some(&row.member)
                } else {
                    (row.member == id).then_some(&row.owner)
                }?;
                self.get(target_namespace, target)
                    .map(|attrs| Value::Object(entity_json(target, attrs)))
            })
            .collect()
    }

    fn query(&self, schema: &Schema, query: &Query) -> Result<Vec<Value>> {
        schema.entity(&query.namespace)?;
        let includes = query
            .include
            .iter()
            .map(|label| schema.link(&query.namespace, label).map(|path| (label, path)))
            .collect::<Result<Vec<_>>>()?;

        let results = self
            .entities
            .iter()
            .filter(|((namespace, id), attrs)| {
                namespace == &query.namespace && matches_filter(id, attrs, query)
            })
            .map(|((_, id), attrs)| {
                let mut object = entity_json(id, attrs);
                for (label, path) in &includes {
                    object.insert(label.to_string(), Value::Array(self.linked(*path, id)));
                }
                Value::Object(object)
            })
            .collect();

        Ok(results)
    }
}

fn matches_filter(id: &str, attrs: &Map<String, Value>, query: &Query) -> bool {
    match &query.filter {
        None => true,
        Some((attr, value)) if attr == "id" => value.as_str() == Some(id),
        Some((attr, value)) => attrs.get(attr) == Some(value),
    }
}

/// Store backend holding everything in process memory
pub struct MemoryStore {
    schema: Schema,
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            state: RwLock::new(MemoryState::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Schema::app())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn query(&self, query: Query) -> Result<Vec<Value>> {
        let state = self.state.read().await;
        state.query(&self.schema, &query)
    }

    async fn transact(&self, steps: Vec<TxStep>) -> Result<TxReceipt> {
        let mut state = self.state.write().await;

        let mut next = state.clone();
        for step in steps {
            next.apply(&self.schema, step)?;
        }
        next.last_tx_id += 1;
        let receipt = TxReceipt {
            tx_id: next.last_tx_id,
        };
        *state = next;

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::default();
        store
            .transact(vec![
                TxStep::update("conversations", "c1", json!({"name": "general", "createdAt": 1})),
                TxStep::update("messages", "m1", json!({"role": "user", "content": "hi", "createdAt": 2})),
                TxStep::link("messages", "m1", "conversation", "c1"),
            ])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_transact_assigns_increasing_tx_ids() {
        let store = MemoryStore::default();
        let first = store
            .transact(vec![TxStep::update("bunnies", "b1", json!({"name": "a"}))])
            .await
            .unwrap();
        let second = store
            .transact(vec![TxStep::update("bunnies", "b2", json!({"name": "b"}))])
            .await
            .unwrap();
        assert!(second.tx_id > first.tx_id);
    }

    #[tokio::test]
    async fn test_query_includes_links_from_both_sides() {
        let store = seeded().await;

        let conversations = store
            .query(Query::new("conversations").with_id("c1").including("messages"))
            .await
            .unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0]["messages"][0]["id"], "m1");

        let messages = store
            .query(Query::new("messages").including("conversation"))
            .await
            .unwrap();
        assert_eq!(messages[0]["conversation"][0]["name"], "general");
    }

    #[tokio::test]
    async fn test_failed_step_discards_whole_batch() {
        let store = seeded().await;

        let err = store
            .transact(vec![
                TxStep::update("bunnies", "b1", json!({"name": "Thumper"})),
                TxStep::check("conversations", "c1", &["data", "numMessages"], json!(5)),
            ])
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let bunnies = store.query(Query::new("bunnies")).await.unwrap();
        assert!(bunnies.is_empty());
    }

    #[tokio::test]
    async fn test_check_on_missing_entity_conflicts() {
        let store = MemoryStore::default();
        let err = store
            .transact(vec![TxStep::check("conversations", "nope", &["data"], Value::Null)])
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_link_to_missing_entity_fails() {
        let store = seeded().await;
        let err = store
            .transact(vec![
                TxStep::update("messages", "m2", json!({"role": "user", "content": "yo"})),
                TxStep::link("messages", "m2", "conversation", "missing"),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingEntity { .. }));
    }

    #[tokio::test]
    async fn test_relinking_message_moves_it() {
        let store = seeded().await;
        store
            .transact(vec![
                TxStep::update("conversations", "c2", json!({"name": "random"})),
                TxStep::link("messages", "m1", "conversation", "c2"),
            ])
            .await
            .unwrap();

        let c1 = store
            .query(Query::new("conversations").with_id("c1").including("messages"))
            .await
            .unwrap();
        assert_eq!(c1[0]["messages"], json!([]));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_messages() {
        let store = seeded().await;
        store
            .transact(vec![TxStep::delete("conversations", "c1")])
            .await
            .unwrap();

        assert!(store.query(Query::new("conversations")).await.unwrap().is_empty());
        assert!(store.query(Query::new("messages")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filter_on_attribute() {
        let store = seeded().await;
        let found = store
            .query(Query::new("conversations").with_filter("name", json!("general")))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        let missing = store
            .query(Query::new("conversations").with_filter("name", json!("other")))
            .await
            .unwrap();
        assert!(missing.is_empty());
    }
}
