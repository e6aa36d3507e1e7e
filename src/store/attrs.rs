//! JSON attribute helpers shared by the store backends

use serde_json::{Map, Value};

/// Recursively merge `patch` into `target`
///
/// Objects merge key by key; any other value in `patch` replaces what is in
/// `target`.
pub fn deep_merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                match target_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, patch_value),
                    None => {
                        target_map.insert(key, patch_value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

/// Apply an `Update`: replace each given top-level attribute
pub fn apply_update(attrs: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        attrs.insert(key, value);
    }
}

/// Apply a `Merge`: deep-merge each given top-level attribute
pub fn apply_merge(attrs: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        match attrs.get_mut(&key) {
            Some(existing) => deep_merge(existing, value),
            None => {
                attrs.insert(key, value);
            }
        }
    }
}

/// Value at a nested attribute path; missing segments read as `null`
pub fn value_at_path(attrs: &Map<String, Value>, path: &[String]) -> Value {
    let Some((first, rest)) = path.split_first() else {
        return Value::Object(attrs.clone());
    };

    let mut current = match attrs.get(first) {
        Some(value) => value,
        None => return Value::Null,
    };
    for segment in rest {
        current = match current.get(segment) {
            Some(value) => value,
            None => return Value::Null,
        };
    }
    current.clone()
}

/// Entity as returned from a query: its attributes plus `id`
pub fn entity_json(id: &str, attrs: &Map<String, Value>) -> Map<String, Value> {
    let mut object = attrs.clone();
    object.insert("id".to_string(), Value::String(id.to_string()));
    object
}
