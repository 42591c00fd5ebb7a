//! Value templates and the generation collaborator.
//!
//! The `add` write path can fill absent properties from a declarative
//! template before identity derivation. Generation itself is an external
//! capability behind the [`Generator`] trait; [`RandomGenerator`] is the
//! default implementation.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Property → template, applied to absent members only.
pub type ValueTemplateMap = BTreeMap<String, ValueTemplate>;

/// A declarative template for one generated value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ValueTemplate {
    /// A fresh v4 UUID string.
    Uuid,
    /// An integer in `min..=max`.
    Integer {
        /// Lower bound, inclusive.
        min: i64,
        /// Upper bound, inclusive.
        max: i64,
    },
    /// A lowercase alphabetic string of the given length.
    Text {
        /// Number of characters.
        length: usize,
    },
    /// A random boolean.
    Boolean,
    /// One of the given values, picked uniformly.
    OneOf {
        /// Candidate values.
        values: Vec<Value>,
    },
    /// A fixed value, used verbatim.
    Fixed {
        /// The value.
        value: Value,
    },
}

/// Produces concrete values from templates.
pub trait Generator: Send + Sync {
    /// Generates one value for the template.
    fn generate(&self, template: &ValueTemplate) -> Value;
}

/// The default generator, backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGenerator;

impl RandomGenerator {
    /// Creates a default generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Generator for RandomGenerator {
    fn generate(&self, template: &ValueTemplate) -> Value {
        let mut rng = rand::thread_rng();
        match template {
            ValueTemplate::Uuid => Value::String(Uuid::new_v4().to_string()),
            ValueTemplate::Integer { min, max } => {
                let (lo, hi) = if min <= max { (*min, *max) } else { (*max, *min) };
                Value::from(rng.gen_range(lo..=hi))
            }
            ValueTemplate::Text { length } => {
                let text: String = (0..*length)
                    .map(|_| rng.gen_range(b'a'..=b'z') as char)
                    .collect();
                Value::String(text)
            }
            ValueTemplate::Boolean => Value::Bool(rng.gen_bool(0.5)),
            ValueTemplate::OneOf { values } => {
                if values.is_empty() {
                    Value::Null
                } else {
                    values[rng.gen_range(0..values.len())].clone()
                }
            }
            ValueTemplate::Fixed { value } => value.clone(),
        }
    }
}

/// Fills absent members of a row from the template map.
///
/// Present members (including explicit nulls) are left untouched.
pub(crate) fn fill_defaults(
    row: &mut Value,
    templates: &ValueTemplateMap,
    generator: &dyn Generator,
) {
    let Some(map) = row.as_object_mut() else {
        return;
    };
    for (property, template) in templates {
        if !map.contains_key(property) {
            map.insert(property.clone(), generator.generate(template));
        }
    }
}
