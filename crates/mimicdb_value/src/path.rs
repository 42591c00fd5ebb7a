//! Dot-path access into nested JSON objects.

use serde_json::Value;

/// Resolves a dot-separated path (`"a.b.c"`) against a value.
///
/// Only object members are traversed; arrays and scalars terminate the
/// walk. An empty path resolves to the value itself.
#[must_use]
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Mutable variant of [`resolve_path`].
pub fn resolve_path_mut<'a>(value: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    if path.is_empty() {
        return Some(value);
    }
    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object_mut()?.get_mut(segment)?;
    }
    Some(current)
}

/// Replaces the value at `path`, returning `true` if the full path existed.
///
/// Intermediate segments are not created; a missing segment leaves the
/// value untouched.
pub fn set_at_path(value: &mut Value, path: &str, new_value: Value) -> bool {
    match resolve_path_mut(value, path) {
        Some(slot) => {
            *slot = new_value;
            true
        }
        None => false,
    }
}

/// Removes the member at `path` from its parent object.
///
/// Returns the removed value, or `None` if the path did not resolve to an
/// object member.
pub fn remove_at_path(value: &mut Value, path: &str) -> Option<Value> {
    let (parent_path, leaf) = match path.rsplit_once('.') {
        Some((parent, leaf)) => (parent, leaf),
        None => ("", path),
    };
    resolve_path_mut(value, parent_path)?
        .as_object_mut()?
        .remove(leaf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolve_nested() {
        let v = json!({"a": {"b": {"c": 42}}});
        assert_eq!(resolve_path(&v, "a.b.c"), Some(&json!(42)));
        assert_eq!(resolve_path(&v, "a.b"), Some(&json!({"c": 42})));
        assert_eq!(resolve_path(&v, ""), Some(&v));
    }

    #[test]
    fn resolve_missing_segment() {
        let v = json!({"a": {"b": 1}});
        assert_eq!(resolve_path(&v, "a.x"), None);
        assert_eq!(resolve_path(&v, "a.b.c"), None);
    }

    #[test]
    fn resolve_stops_at_arrays() {
        let v = json!({"a": [{"b": 1}]});
        assert_eq!(resolve_path(&v, "a.b"), None);
    }

    #[test]
    fn set_replaces_existing() {
        let mut v = json!({"a": {"b": 1}});
        assert!(set_at_path(&mut v, "a.b", json!(2)));
        assert_eq!(v, json!({"a": {"b": 2}}));
    }

    #[test]
    fn set_does_not_create_segments() {
        let mut v = json!({"a": {}});
        assert!(!set_at_path(&mut v, "a.b.c", json!(1)));
        assert_eq!(v, json!({"a": {}}));
    }

    #[test]
    fn remove_leaf() {
        let mut v = json!({"a": {"b": 1, "c": 2}});
        assert_eq!(remove_at_path(&mut v, "a.b"), Some(json!(1)));
        assert_eq!(v, json!({"a": {"c": 2}}));
    }

    #[test]
    fn remove_top_level() {
        let mut v = json!({"a": 1});
        assert_eq!(remove_at_path(&mut v, "a"), Some(json!(1)));
        assert_eq!(v, json!({}));
    }
}
