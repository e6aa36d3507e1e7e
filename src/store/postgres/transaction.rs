//! Transaction support for the PostgreSQL store backend
//!
//! A `Transaction` wraps one pooled connection between `BEGIN` and
//! `COMMIT`/`ROLLBACK`. Every step of a batch is applied through it, so the
//! batch lands atomically.

use deadpool_postgres::Object;
use serde_json::{Map, Value};

use crate::store::{
    attrs::{apply_merge, apply_update, value_at_path},
    error::{Result, StoreError},
    schema::{Cardinality, LinkPath, Schema},
    types::TxStep,
};

/// A store transaction on a single pooled connection
///
/// Dropping a transaction that was neither committed nor rolled back (for
/// example when the request future is cancelled) detaches the connection from
/// the pool and closes it, which makes the server abort the transaction.
pub struct Transaction {
    connection: Option<Object>,
    schema_name: String,
    app_id: String,
    in_transaction: bool,
}

impl Transaction {
    /// Begin a new transaction
    pub(crate) async fn begin(connection: Object, schema_name: String, app_id: String) -> Result<Self> {
        connection
            .batch_execute("BEGIN")
            .await
            .map_err(|e| StoreError::Database(format!("Failed to begin transaction: {:?}", e)))?;

        Ok(Self {
            connection: Some(connection),
            schema_name,
            app_id,
            in_transaction: true,
        })
    }

    fn get_connection(&self) -> Result<&Object> {
        if !self.in_transaction {
            return Err(StoreError::Database("Transaction already completed".to_string()));
        }
        self.connection
            .as_ref()
            .ok_or_else(|| StoreError::Database("No connection available".to_string()))
    }

    /// Apply one batch step inside this transaction
    ///
    /// Attribute writes lock the entity row, compute the new attributes the
    /// same way the memory backend does, and write them back.
    pub async fn apply(&mut self, schema: &Schema, step: TxStep) -> Result<()> {
        match step {
            TxStep::Update {
                namespace,
                id,
                attrs,
            } => {
                schema.check_attrs(&namespace, &attrs)?;
                let mut current = self.load_for_update(&namespace, &id).await?.unwrap_or_default();
                apply_update(&mut current, attrs);
                self.store(&namespace, &id, current).await
            }
            TxStep::Merge {
                namespace,
                id,
                attrs,
            } => {
                schema.check_attrs(&namespace, &attrs)?;
                let mut current = self.load_for_update(&namespace, &id).await?.unwrap_or_default();
                apply_merge(&mut current, attrs);
                self.store(&namespace, &id, current).await
            }
            TxStep::Link {
                namespace,
                id,
                label,
                target,
            } => {
                let path = schema.link(&namespace, &label)?;
                self.require(&namespace, &id).await?;
                self.require(path.target_namespace(), &target).await?;
                self.link(path, &id, &target).await
            }
            TxStep::Delete { namespace, id } => {
                schema.entity(&namespace)?;
                self.delete(schema, &namespace, &id).await
            }
            TxStep::Check {
                namespace,
                id,
                path,
                expected,
            } => {
                let current = self.load_for_update(&namespace, &id).await?;
                let actual = current
                    .as_ref()
                    .map(|attrs| value_at_path(attrs, &path))
                    .unwrap_or(Value::Null);
                if current.is_none() || actual != expected {
                    return Err(StoreError::Conflict {
                        namespace,
                        id,
                        expected,
                        actual,
                    });
                }
                Ok(())
            }
        }
    }

    /// Allocate the transaction id for this batch
    pub async fn record(&self) -> Result<i64> {
        let conn = self.get_connection()?;
        let sql = format!(
            "INSERT INTO {}.transactions (app_id) VALUES ($1) RETURNING tx_id",
            self.schema_name
        );
        let row = conn.query_one(&sql, &[&self.app_id]).await?;
        Ok(row.get(0))
    }

    async fn load_for_update(&self, namespace: &str, id: &str) -> Result<Option<Map<String, Value>>> {
        let conn = self.get_connection()?;
        let sql = format!(
            "SELECT attrs FROM {}.entities WHERE app_id = $1 AND namespace = $2 AND id = $3 FOR UPDATE",
            self.schema_name
        );

        let row = conn.query_opt(&sql, &[&self.app_id, &namespace, &id]).await?;
        match row {
            None => Ok(None),
            Some(row) => match row.get::<_, Value>(0) {
                Value::Object(attrs) => Ok(Some(attrs)),
                other => Err(StoreError::Serialization(format!(
                    "attributes of {}/{} are not an object: {}",
                    namespace, id, other
                ))),
            },
        }
    }

    async fn store(&self, namespace: &str, id: &str, attrs: Map<String, Value>) -> Result<()> {
        let conn = self.get_connection()?;
        let sql = format!(
            "INSERT INTO {}.entities (app_id, namespace, id, attrs) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (app_id, namespace, id) DO UPDATE SET attrs = EXCLUDED.attrs",
            self.schema_name
        );

        let attrs = Value::Object(attrs);
        conn.execute(&sql, &[&self.app_id, &namespace, &id, &attrs])
            .await?;
        Ok(())
    }

    async fn require(&self, namespace: &str, id: &str) -> Result<()> {
        let conn = self.get_connection()?;
        let sql = format!(
            "SELECT 1 FROM {}.entities WHERE app_id = $1 AND namespace = $2 AND id = $3",
            self.schema_name
        );

        match conn.query_opt(&sql, &[&self.app_id, &namespace, &id]).await? {
            Some(_) => Ok(()),
            None => Err(StoreError::MissingEntity {
                namespace: namespace.to_string(),
                id: id.to_string(),
            }),
        }
    }

    async fn link(&self, path: LinkPath<'_>, source: &str, target: &str) -> Result<()> {
        let conn = self.get_connection()?;
        let (owner, member) = path.owner_member(source, target);
        let def = path.def;

        if def.reverse.has == Cardinality::One {
            let sql = format!(
                "DELETE FROM {}.links WHERE app_id = $1 AND link = $2 AND member_id = $3",
                self.schema_name
            );
            conn.execute(&sql, &[&self.app_id, &def.name, &member]).await?;
        }
        if def.forward.has == Cardinality::One {
            let sql = format!(
                "DELETE FROM {}.links WHERE app_id = $1 AND link = $2 AND owner_id = $3",
                self.schema_name
            );
            conn.execute(&sql, &[&self.app_id, &def.name, &owner]).await?;
        }

        let sql = format!(
            "INSERT INTO {}.links (app_id, link, owner_id, member_id) VALUES ($1, $2, $3, $4) \
             ON CONFLICT DO NOTHING",
            self.schema_name
        );
        conn.execute(&sql, &[&self.app_id, &def.name, &owner, &member])
            .await?;
        Ok(())
    }

    async fn delete(&self, schema: &Schema, namespace: &str, id: &str) -> Result<()> {
        let conn = self.get_connection()?;
        let mut pending = vec![(namespace.to_string(), id.to_string())];

        while let Some((namespace, id)) = pending.pop() {
            let sql = format!(
                "DELETE FROM {}.entities WHERE app_id = $1 AND namespace = $2 AND id = $3",
                self.schema_name
            );
            if conn.execute(&sql, &[&self.app_id, &namespace, &id]).await? == 0 {
                continue;
            }

            for def in schema.cascades_from(&namespace) {
                let sql = format!(
                    "SELECT member_id FROM {}.links WHERE app_id = $1 AND link = $2 AND owner_id = $3",
                    self.schema_name
                );
                let rows = conn.query(&sql, &[&self.app_id, &def.name, &id]).await?;
                pending.extend(
                    rows.iter()
                        .map(|row| (def.reverse.namespace.to_string(), row.get::<_, String>(0))),
                );
            }

            for def in schema.links_of(&namespace) {
                for (side_namespace, column) in [
                    (def.forward.namespace, "owner_id"),
                    (def.reverse.namespace, "member_id"),
                ] {
                    if side_namespace != namespace {
                        continue;
                    }
                    let sql = format!(
                        "DELETE FROM {}.links WHERE app_id = $1 AND link = $2 AND {} = $3",
                        self.schema_name, column
                    );
                    conn.execute(&sql, &[&self.app_id, &def.name, &id]).await?;
                }
            }
        }

        Ok(())
    }

    /// Commit the transaction
    pub async fn commit(mut self) -> Result<()> {
        if self.in_transaction {
            if let Some(conn) = &self.connection {
                conn.batch_execute("COMMIT")
                    .await
                    .map_err(|e| StoreError::Database(format!("Failed to commit transaction: {:?}", e)))?;
                self.in_transaction = false;
            }
        }
        Ok(())
    }

    /// Rollback the transaction
    pub async fn rollback(mut self) -> Result<()> {
        if self.in_transaction {
            if let Some(conn) = &self.connection {
                conn.batch_execute("ROLLBACK")
                    .await
                    .map_err(|e| StoreError::Database(format!("Failed to rollback transaction: {:?}", e)))?;
                self.in_transaction = false;
            }
        }
        Ok(())
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.in_transaction {
            if let Some(conn) = self.connection.take() {
                drop(Object::take(conn));
            }
        }
    }
}
