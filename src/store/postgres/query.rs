use deadpool_postgres::Object;
use serde_json::{Map, Value};
use tokio_postgres::Row;

use crate::store::{
    error::{Result, StoreError},
    schema::{LinkPath, Schema},
    types::Query,
};

/// Run a declarative query against the entity and link tables
///
/// Results are ordered by insertion. Each included label adds an array of the
/// linked entities, ordered by when the link was made.
pub async fn query_entities(
    conn: &Object,
    schema_name: &str,
    app_id: &str,
    schema: &Schema,
    query: &Query,
) -> Result<Vec<Value>> {
    schema.entity(&query.namespace)?;
    let includes = query
        .include
        .iter()
        .map(|label| schema.link(&query.namespace, label).map(|path| (label, path)))
        .collect::<Result<Vec<_>>>()?;

    let base = format!(
        "SELECT id, attrs FROM {}.entities WHERE app_id = $1 AND namespace = $2",
        schema_name
    );

    let rows = match &query.filter {
        None => {
            let sql = format!("{} ORDER BY seq", base);
            conn.query(&sql, &[&app_id, &query.namespace]).await?
        }
        Some((attr, value)) if attr == "id" => match value.as_str() {
            Some(id) => {
                let sql = format!("{} AND id = $3", base);
                conn.query(&sql, &[&app_id, &query.namespace, &id]).await?
            }
            None => Vec::new(),
        },
        Some((attr, value)) => {
            let sql = format!("{} AND attrs -> $3::text = $4::jsonb ORDER BY seq", base);
            conn.query(&sql, &[&app_id, &query.namespace, attr, value])
                .await?
        }
    };

    let mut results = Vec::with_capacity(rows.len());
    for row in &rows {
        let (id, mut object) = parse_entity_row(row)?;
        for (label, path) in &includes {
            let linked = linked_entities(conn, schema_name, app_id, *path, &id).await?;
            object.insert(label.to_string(), Value::Array(linked));
        }
        results.push(Value::Object(object));
    }

    Ok(results)
}

async fn linked_entities(
    conn: &Object,
    schema_name: &str,
    app_id: &str,
    path: LinkPath<'_>,
    id: &str,
) -> Result<Vec<Value>> {
    let (match_column, target_column) = if path.from_owner {
        ("owner_id", "member_id")
    } else {
        ("member_id", "owner_id")
    };
    let target_namespace = path.target_namespace();

    let sql = format!(
        "SELECT e.id, e.attrs FROM {s}.links l \
         JOIN {s}.entities e ON e.app_id = l.app_id AND e.namespace = $4 AND e.id = l.{target} \
         WHERE l.app_id = $1 AND l.link = $2 AND l.{matching} = $3 \
         ORDER BY l.seq",
        s = schema_name,
        target = target_column,
        matching = match_column
    );

    let rows = conn
        .query(&sql, &[&app_id, &path.def.name, &id, &target_namespace])
        .await?;

    rows.iter()
        .map(|row| parse_entity_row(row).map(|(_, object)| Value::Object(object)))
        .collect()
}

/// Parse an `(id, attrs)` row into the entity object returned by queries
pub(crate) fn parse_entity_row(row: &Row) -> Result<(String, Map<String, Value>)> {
    let id: String = row.get(0);
    let attrs: Value = row.get(1);

    match attrs {
        Value::Object(mut object) => {
            object.insert("id".to_string(), Value::String(id.clone()));
            Ok((id, object))
        }
        other => Err(StoreError::Serialization(format!(
            "attributes of entity {} are not an object: {}",
            id, other
        ))),
    }
}
