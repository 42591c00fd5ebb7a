//! Store option declarations.

use crate::schema::trigger::Trigger;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cascade policy applied to embedded copies of deleted entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CascadeType {
    /// Remove the embedding property entirely.
    Delete,
    /// Overwrite the embedding property with null.
    Null,
    /// Overwrite the embedding property with an undefined marker.
    ///
    /// JSON carries no undefined; the stored value is null, the reported
    /// policy stays `Undefined`.
    Undefined,
    /// Leave ancestor rows untouched.
    #[default]
    Keep,
}

/// Declared options for one store.
///
/// Options are (re)registered on every write that names the store. Linked
/// keys declare which properties embed entities of other stores; their
/// nested options register those stores too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreOptions {
    /// Store name, unique across the database.
    pub store_name: String,
    /// Property the entity identity is derived from.
    pub primary_key: String,
    /// Properties whose inferred indices carry the unique flag.
    #[serde(default)]
    pub unique_keys: Vec<String>,
    /// Property → options of the store its value belongs to.
    #[serde(default)]
    pub linked_keys: BTreeMap<String, StoreOptions>,
    /// Cascade policy for embedded copies when rows of this store hold
    /// entities that get deleted out from under them.
    #[serde(default)]
    pub cascade: CascadeType,
    /// Declared compound-index triggers.
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    /// Whether raw content is retained after schema inference.
    #[serde(default = "default_persist")]
    pub persist: bool,
}

const fn default_persist() -> bool {
    true
}

impl StoreOptions {
    /// Creates options with a name and primary-key property.
    #[must_use]
    pub fn new(store_name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            store_name: store_name.into(),
            primary_key: primary_key.into(),
            unique_keys: Vec::new(),
            linked_keys: BTreeMap::new(),
            cascade: CascadeType::default(),
            triggers: Vec::new(),
            persist: true,
        }
    }

    /// Declares a linked property embedding entities of another store.
    #[must_use]
    pub fn linked_key(mut self, property: impl Into<String>, options: StoreOptions) -> Self {
        self.linked_keys.insert(property.into(), options);
        self
    }

    /// Declares properties whose indices must be unique.
    #[must_use]
    pub fn unique_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the cascade policy.
    #[must_use]
    pub fn cascade(mut self, cascade: CascadeType) -> Self {
        self.cascade = cascade;
        self
    }

    /// Declares a trigger.
    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    /// Marks the store structure-only: content feeds schema inference but
    /// no rows are retained.
    #[must_use]
    pub fn structure_only(mut self) -> Self {
        self.persist = false;
        self
    }

    /// Merges freshly declared options into this entry.
    ///
    /// Scalars are replaced; unique keys are unioned; linked keys merge
    /// recursively; triggers are replaced only when the new declaration
    /// carries any, so a shallow re-registration keeps earlier triggers.
    pub fn merge_from(&mut self, new: &StoreOptions) {
        self.primary_key = new.primary_key.clone();
        self.cascade = new.cascade;
        self.persist = new.persist;
        for key in &new.unique_keys {
            if !self.unique_keys.contains(key) {
                self.unique_keys.push(key.clone());
            }
        }
        for (property, child) in &new.linked_keys {
            match self.linked_keys.get_mut(property) {
                Some(existing) => existing.merge_from(child),
                None => {
                    self.linked_keys.insert(property.clone(), child.clone());
                }
            }
        }
        if !new.triggers.is_empty() {
            self.triggers = new.triggers.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_serialization() {
        let options = StoreOptions::new("Person", "id")
            .linked_key("location", StoreOptions::new("Location", "@id"));
        let raw = serde_json::to_string(&options).unwrap();
        assert!(raw.contains("\"storeName\":\"Person\""));
        assert!(raw.contains("\"primaryKey\":\"id\""));
        assert!(raw.contains("\"linkedKeys\""));
    }

    #[test]
    fn defaults_on_deserialize() {
        let options: StoreOptions =
            serde_json::from_str(r#"{"storeName":"Person","primaryKey":"id"}"#).unwrap();
        assert!(options.persist);
        assert_eq!(options.cascade, CascadeType::Keep);
        assert!(options.linked_keys.is_empty());
    }

    #[test]
    fn merge_unions_unique_keys_and_keeps_triggers() {
        let mut existing = StoreOptions::new("Person", "id")
            .unique_keys(["email"])
            .trigger(Trigger::new("byId", vec![]));
        let incoming = StoreOptions::new("Person", "id").unique_keys(["name"]);

        existing.merge_from(&incoming);
        assert_eq!(existing.unique_keys, vec!["email", "name"]);
        assert_eq!(existing.triggers.len(), 1);
    }

    #[test]
    fn merge_recurses_into_linked_keys() {
        let mut existing = StoreOptions::new("Person", "id").linked_key(
            "location",
            StoreOptions::new("Location", "@id").unique_keys(["name"]),
        );
        let incoming = StoreOptions::new("Person", "id")
            .linked_key("location", StoreOptions::new("Location", "@id"));

        existing.merge_from(&incoming);
        let location = existing.linked_keys.get("location").unwrap();
        assert_eq!(location.unique_keys, vec!["name"]);
    }
}
