//! Identity derivation from primary-key property values.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use uuid::Uuid;

static UUID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        "[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    )
    .expect("uuid pattern is valid")
});

/// Derives an entity identity from the value of its primary-key property.
///
/// If the value contains a UUID-shaped substring, the UUID is the identity.
/// Otherwise, string values shaped like a path (`/api/locations/1`) yield
/// their trailing segment, and plain values are used raw. Numbers and
/// booleans identify by their display form. Null, arrays and objects carry
/// no identity, as does an empty string.
#[must_use]
pub fn derive_identity(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            if let Some(found) = UUID_PATTERN.find(s) {
                if Uuid::parse_str(found.as_str()).is_ok() {
                    return Some(found.as_str().to_lowercase());
                }
            }
            let trimmed = s.trim_end_matches('/');
            let tail = match trimmed.rsplit_once('/') {
                Some((_, tail)) => tail,
                None => trimmed,
            };
            if tail.is_empty() {
                None
            } else {
                Some(tail.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
