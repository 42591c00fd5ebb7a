//! Test fixtures and database helpers.

use mimicdb_core::{Database, StoreOptions};
use serde_json::{json, Value};
use std::sync::Once;

static LOGGING: Once = Once::new();

/// Installs a compact tracing subscriber once, honoring `RUST_LOG`.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A wired in-memory test database.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
}

impl TestDatabase {
    /// Opens a fresh in-memory database under the given name.
    pub async fn new(name: &str) -> Self {
        init_test_logging();
        Self {
            db: Database::open_in_memory(name)
                .await
                .expect("failed to open in-memory database"),
        }
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Options for the plain Location store.
#[must_use]
pub fn location_options() -> StoreOptions {
    StoreOptions::new("Location", "@id")
}

/// Options for Person embedding a Location under `location`.
#[must_use]
pub fn person_options() -> StoreOptions {
    StoreOptions::new("Person", "id").linked_key("location", location_options())
}

/// Options for SchoolClass embedding a Person (which embeds a Location).
#[must_use]
pub fn school_class_options() -> StoreOptions {
    StoreOptions::new("SchoolClass", "id").linked_key("person", person_options())
}

/// A Location entity with the given numeric tail identity.
#[must_use]
pub fn sample_location(id: u32, name: &str) -> Value {
    json!({
        "@id": format!("/api/locations/{id}"),
        "name": name
    })
}

/// A Person entity embedding a Location.
#[must_use]
pub fn sample_person(id: &str, name: &str, location: Value) -> Value {
    json!({
        "id": id,
        "name": name,
        "location": location
    })
}

/// A SchoolClass entity embedding a Person.
#[must_use]
pub fn sample_school_class(id: &str, person: Value) -> Value {
    json!({
        "id": id,
        "person": person
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_opens() {
        let fixture = TestDatabase::new("fixture-smoke").await;
        assert_eq!(fixture.config().database_name, "fixture-smoke");
    }

    #[test]
    fn sample_shapes() {
        let location = sample_location(1, "Test");
        assert_eq!(location["@id"], json!("/api/locations/1"));

        let person = sample_person("p1", "Ada", location);
        assert_eq!(person["location"]["name"], json!("Test"));
    }
}
