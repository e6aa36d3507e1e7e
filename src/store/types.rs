use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Declarative read against one namespace
///
/// # Example
///
/// ```
/// use burrow::store::Query;
///
/// let query = Query::new("conversations")
///     .with_id("c-123")
///     .including("messages");
/// assert_eq!(query.include, vec!["messages".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Namespace to read from
    pub namespace: String,

    /// Optional equality filter `(attribute, value)`; `id` is allowed
    pub filter: Option<(String, Value)>,

    /// Link labels whose targets are embedded in each result
    pub include: Vec<String>,
}

impl Query {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            filter: None,
            include: Vec::new(),
        }
    }

    /// Filter on the entity id (builder pattern)
    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with_filter("id", Value::String(id.into()))
    }

    /// Filter on an attribute value (builder pattern)
    pub fn with_filter(mut self, attr: impl Into<String>, value: Value) -> Self {
        self.filter = Some((attr.into(), value));
        self
    }

    /// Embed linked entities under `label` (builder pattern)
    pub fn including(mut self, label: impl Into<String>) -> Self {
        self.include.push(label.into());
        self
    }

    /// The id this query is restricted to, if any
    pub fn id_filter(&self) -> Option<&str> {
        match &self.filter {
            Some((attr, Value::String(id))) if attr == "id" => Some(id),
            _ => None,
        }
    }
}

/// A single write inside an atomic batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TxStep {
    /// Create or update an entity; given top-level attributes are replaced
    Update {
        namespace: String,
        id: String,
        attrs: Map<String, Value>,
    },

    /// Create or update an entity; nested objects are deep-merged
    Merge {
        namespace: String,
        id: String,
        attrs: Map<String, Value>,
    },

    /// Link two existing entities through a declared label
    Link {
        namespace: String,
        id: String,
        label: String,
        target: String,
    },

    /// Remove an entity, its links, and cascade-linked members
    Delete { namespace: String, id: String },

    /// Fail the whole batch unless the value at `path` equals `expected`
    ///
    /// A missing entity always fails; a missing path reads as `null`.
    Check {
        namespace: String,
        id: String,
        path: Vec<String>,
        expected: Value,
    },
}

impl TxStep {
    pub fn update(namespace: impl Into<String>, id: impl Into<String>, attrs: Value) -> Self {
        TxStep::Update {
            namespace: namespace.into(),
            id: id.into(),
            attrs: into_map(attrs),
        }
    }

    pub fn merge(namespace: impl Into<String>, id: impl Into<String>, attrs: Value) -> Self {
        TxStep::Merge {
            namespace: namespace.into(),
            id: id.into(),
            attrs: into_map(attrs),
        }
    }

    pub fn link(
        namespace: impl Into<String>,
        id: impl Into<String>,
        label: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        TxStep::Link {
            namespace: namespace.into(),
            id: id.into(),
            label: label.into(),
            target: target.into(),
        }
    }

    pub fn delete(namespace: impl Into<String>, id: impl Into<String>) -> Self {
        TxStep::Delete {
            namespace: namespace.into(),
            id: id.into(),
        }
    }

    pub fn check(
        namespace: impl Into<String>,
        id: impl Into<String>,
        path: &[&str],
        expected: Value,
    ) -> Self {
        TxStep::Check {
            namespace: namespace.into(),
            id: id.into(),
            path: path.iter().map(|p| p.to_string()).collect(),
            expected,
        }
    }
}

/// Non-object attribute payloads become an empty set of attributes
fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Result of a committed batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    #[serde(rename = "tx-id")]
    pub tx_id: i64,
}
