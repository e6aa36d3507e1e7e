//! Schema declaration for the store
//!
//! Declares the entity namespaces, their attribute types, and the links
//! between them. Both store backends check every write against the schema and
//! use the link declarations to resolve `include` labels in queries.

use serde_json::{Map, Value};

use crate::store::error::{Result, StoreError};

/// JSON type an attribute must hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    String,
    Number,
    Boolean,
    /// Any JSON value
    Json,
}

impl AttrType {
    fn accepts(&self, value: &Value) -> bool {
        // null clears an attribute and is accepted for every type
        if value.is_null() {
            return true;
        }
        match self {
            AttrType::String => value.is_string(),
            AttrType::Number => value.is_number(),
            AttrType::Boolean => value.is_boolean(),
            AttrType::Json => true,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AttrType::String => "string",
            AttrType::Number => "number",
            AttrType::Boolean => "boolean",
            AttrType::Json => "json",
        }
    }
}

/// An entity namespace and its attributes
#[derive(Debug, Clone)]
pub struct EntityDef {
    pub namespace: &'static str,
    pub attrs: Vec<(&'static str, AttrType)>,
}

impl EntityDef {
    fn attr_type(&self, attr: &str) -> Option<AttrType> {
        self.attrs
            .iter()
            .find(|(name, _)| *name == attr)
            .map(|(_, attr_type)| *attr_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

/// One side of a link: the namespace it hangs off and the label used there
#[derive(Debug, Clone)]
pub struct LinkEnd {
    pub namespace: &'static str,
    pub label: &'static str,
    pub has: Cardinality,
}

/// A link between two namespaces
///
/// The forward side owns the link. Deleting an owner removes its linked
/// members too when `cascade_delete` is set.
#[derive(Debug, Clone)]
pub struct LinkDef {
    pub name: &'static str,
    pub forward: LinkEnd,
    pub reverse: LinkEnd,
    pub cascade_delete: bool,
}

/// A link label resolved from one namespace
#[derive(Debug, Clone, Copy)]
pub struct LinkPath<'a> {
    pub def: &'a LinkDef,
    /// True when the label was resolved from the owning (forward) side
    pub from_owner: bool,
}

impl<'a> LinkPath<'a> {
    /// Namespace of the entities on the other end of the link
    pub fn target_namespace(&self) -> &'static str {
        if self.from_owner {
            self.def.reverse.namespace
        } else {
            self.def.forward.namespace
        }
    }

    /// Order a (source, target) id pair as (owner, member)
    pub fn owner_member<'s>(&self, source: &'s str, target: &'s str) -> (&'s str, &'s str) {
        if self.from_owner {
            (source, target)
        } else {
            (target, source)
        }
    }
}

/// The full set of declared entities and links
#[derive(Debug, Clone)]
pub struct Schema {
    pub entities: Vec<EntityDef>,
    pub links: Vec<LinkDef>,
}

impl Schema {
    /// Schema used by the HTTP service
    pub fn app() -> Self {
        Self {
            entities: vec![
                EntityDef {
                    namespace: "bunnies",
                    attrs: vec![("name", AttrType::String), ("createdAt", AttrType::Number)],
                },
                EntityDef {
                    namespace: "messages",
                    attrs: vec![
                        ("role", AttrType::String),
                        ("content", AttrType::String),
                        ("createdAt", AttrType::Number),
                    ],
                },
                EntityDef {
                    namespace: "conversations",
                    attrs: vec![
                        ("name", AttrType::String),
                        ("createdAt", AttrType::Number),
                        ("data", AttrType::Json),
                    ],
                },
            ],
            links: vec![LinkDef {
                name: "conversationMessages",
                forward: LinkEnd {
                    namespace: "conversations",
                    label: "messages",
                    has: Cardinality::Many,
                },
                reverse: LinkEnd {
                    namespace: "messages",
                    label: "conversation",
                    has: Cardinality::One,
                },
                cascade_delete: true,
            }],
        }
    }

    pub fn entity(&self, namespace: &str) -> Result<&EntityDef> {
        self.entities
            .iter()
            .find(|e| e.namespace == namespace)
            .ok_or_else(|| StoreError::Schema(format!("unknown namespace '{}'", namespace)))
    }

    /// Check a set of attributes against the namespace declaration
    pub fn check_attrs(&self, namespace: &str, attrs: &Map<String, Value>) -> Result<()> {
        let entity = self.entity(namespace)?;

        for (name, value) in attrs {
            if name == "id" {
                return Err(StoreError::Schema(format!(
                    "'id' is reserved and cannot be written on '{}'",
                    namespace
                )));
            }
            let attr_type = entity.attr_type(name).ok_or_else(|| {
                StoreError::Schema(format!("unknown attribute '{}.{}'", namespace, name))
            })?;
            if !attr_type.accepts(value) {
                return Err(StoreError::Schema(format!(
                    "attribute '{}.{}' must be a {}",
                    namespace,
                    name,
                    attr_type.name()
                )));
            }
        }

        Ok(())
    }

    /// Resolve a link label as seen from `namespace`
    pub fn link(&self, namespace: &str, label: &str) -> Result<LinkPath<'_>> {
        for def in &self.links {
            if def.forward.namespace == namespace && def.forward.label == label {
                return Ok(LinkPath {
                    def,
                    from_owner: true,
                });
            }
            if def.reverse.namespace == namespace && def.reverse.label == label {
                return Ok(LinkPath {
                    def,
                    from_owner: false,
                });
            }
        }

        Err(StoreError::Schema(format!(
            "unknown link '{}.{}'",
            namespace, label
        )))
    }

    /// Links owned by `namespace` whose members go away with the owner
    pub fn cascades_from<'a>(&'a self, namespace: &'a str) -> impl Iterator<Item = &'a LinkDef> + 'a {
        self.links
            .iter()
            .filter(move |def| def.cascade_delete && def.forward.namespace == namespace)
    }

    /// Every link touching `namespace`, either side
    pub fn links_of<'a>(&'a self, namespace: &'a str) -> impl Iterator<Item = &'a LinkDef> + 'a {
        self.links.iter().filter(move |def| {
            def.forward.namespace == namespace || def.reverse.namespace == namespace
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_check_attrs_accepts_declared_types() {
        let schema = Schema::app();
        schema
            .check_attrs("bunnies", &attrs(json!({"name": "Thumper", "createdAt": 1})))
            .unwrap();
        schema
            .check_attrs("conversations", &attrs(json!({"data": {"numMessages": 3}})))
            .unwrap();
    }

    #[test]
    fn test_check_attrs_rejects_wrong_type() {
        let schema = Schema::app();
        let err = schema
            .check_attrs("bunnies", &attrs(json!({"name": 42})))
            .unwrap_err();
        assert!(err.to_string().contains("bunnies.name"));
        assert!(err.to_string().contains("string"));
    }

    #[test]
    fn test_check_attrs_rejects_unknown_attribute_and_namespace() {
        let schema = Schema::app();
        assert!(schema
            .check_attrs("bunnies", &attrs(json!({"colour": "white"})))
            .is_err());
        assert!(schema
            .check_attrs("carrots", &attrs(json!({"name": "x"})))
            .is_err());
        assert!(schema
            .check_attrs("bunnies", &attrs(json!({"id": "abc"})))
            .is_err());
    }

    #[test]
    fn test_link_resolves_from_both_sides() {
        let schema = Schema::app();

        let forward = schema.link("conversations", "messages").unwrap();
        assert!(forward.from_owner);
        assert_eq!(forward.target_namespace(), "messages");
        assert_eq!(forward.owner_member("c", "m"), ("c", "m"));

        let reverse = schema.link("messages", "conversation").unwrap();
        assert!(!reverse.from_owner);
        assert_eq!(reverse.target_namespace(), "conversations");
        assert_eq!(reverse.owner_member("m", "c"), ("c", "m"));

        assert!(schema.link("bunnies", "messages").is_err());
    }

    #[test]
    fn test_cascade_declared_on_conversations() {
        let schema = Schema::app();
        let names: Vec<_> = schema.cascades_from("conversations").map(|d| d.name).collect();
        assert_eq!(names, vec!["conversationMessages"]);
        assert_eq!(schema.cascades_from("messages").count(), 0);
        assert_eq!(schema.links_of("messages").count(), 1);
    }
}
