//! Internal entity tags.
//!
//! Persisted rows carry a synthesized identity under [`PKEY`]. Copies of a
//! row embedded inside a parent row additionally carry [`STORE_TAG`] naming
//! the store they came from, so readers can tell an embedded fragment apart
//! from a plain nested object. Both tags are stripped from everything
//! returned to callers.

use serde_json::Value;

/// Synthesized identity member present on every persisted row.
pub const PKEY: &str = "__pkey__";

/// Origin-store member present on embedded copies of linked entities.
pub const STORE_TAG: &str = "__store__";

/// Returns `true` if the value is an embedded linked-entity fragment.
#[must_use]
pub fn is_tagged_entity(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.contains_key(PKEY) && map.contains_key(STORE_TAG))
}

/// Stamps an embedded copy with its identity and origin store.
pub fn tag_entity(value: &mut Value, pkey: &str, store: &str) {
    if let Some(map) = value.as_object_mut() {
        map.insert(PKEY.to_string(), Value::String(pkey.to_string()));
        map.insert(STORE_TAG.to_string(), Value::String(store.to_string()));
    }
}

/// Recursively removes [`PKEY`] and [`STORE_TAG`] members.
pub fn strip_tags(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove(PKEY);
            map.remove(STORE_TAG);
            for member in map.values_mut() {
                strip_tags(member);
            }
        }
        Value::Array(items) => {
            for item in items {
                strip_tags(item);
            }
        }
        _ => {}
    }
}

/// Renders a scalar value as an index-key component.
///
/// Strings are used verbatim; numbers and booleans use their canonical
/// display form. Objects, arrays and nulls are not keyable.
#[must_use]
pub fn scalar_to_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tagging_roundtrip() {
        let mut v = json!({"name": "Test"});
        tag_entity(&mut v, "1", "Location");
        assert!(is_tagged_entity(&v));
        assert_eq!(v[PKEY], json!("1"));
        assert_eq!(v[STORE_TAG], json!("Location"));
    }

    #[test]
    fn plain_object_is_not_tagged() {
        assert!(!is_tagged_entity(&json!({"name": "Test"})));
        assert!(!is_tagged_entity(&json!({"__pkey__": "1"})));
        assert!(!is_tagged_entity(&json!("scalar")));
    }

    #[test]
    fn strip_is_recursive() {
        let mut v = json!({
            "__pkey__": "p1",
            "id": "p1",
            "location": {
                "__pkey__": "1",
                "__store__": "Location",
                "name": "Test"
            },
            "friends": [{"__pkey__": "x", "__store__": "Person", "id": "x"}]
        });
        strip_tags(&mut v);
        assert_eq!(
            v,
            json!({
                "id": "p1",
                "location": {"name": "Test"},
                "friends": [{"id": "x"}]
            })
        );
    }

    #[test]
    fn scalar_keys() {
        assert_eq!(scalar_to_key(&json!("a")), Some("a".to_string()));
        assert_eq!(scalar_to_key(&json!(7)), Some("7".to_string()));
        assert_eq!(scalar_to_key(&json!(true)), Some("true".to_string()));
        assert_eq!(scalar_to_key(&json!(null)), None);
        assert_eq!(scalar_to_key(&json!([1])), None);
        assert_eq!(scalar_to_key(&json!({})), None);
    }
}
