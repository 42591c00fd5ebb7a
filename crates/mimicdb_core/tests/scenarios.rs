//! End-to-end scenarios over the full persistence pipeline.

use mimicdb_core::{
    CascadeType, Config, CoreError, Database, EngineError, KeyQuery, MemoryEngine, PageQuery,
    RequestContext, SearchQuery, SortSpec, StorageEngine, StoreOptions, Trigger, TriggerRule,
    ValueTemplate, ValueTemplateMap,
};
use mimicdb_testkit::{
    location_options, person_options, sample_location, sample_person, sample_school_class,
    school_class_options, TestDatabase,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// Opens a database whose engine handle stays inspectable for raw-row
/// assertions.
async fn db_with_engine(name: &str) -> (Database, Arc<MemoryEngine>) {
    let engine = Arc::new(MemoryEngine::new());
    let db = Database::open(
        Config::new().database_name(name),
        engine.clone(),
        Box::new(mimicdb_core::MemorySidecar::new()),
    )
    .await
    .unwrap();
    (db, engine)
}

#[tokio::test]
async fn round_trip_strips_tags_and_preserves_fields() {
    let db = TestDatabase::new("round-trip").await;
    let entity = json!({
        "@id": "/api/locations/1",
        "name": "Test",
        "zip": 10115,
        "open": true,
        "tags": ["a", "b"]
    });
    db.persist(entity.clone(), &location_options()).await.unwrap();

    let read = db
        .read_by_key("Location", &KeyQuery::single("1"))
        .await
        .unwrap();
    assert_eq!(read, entity);
}

#[tokio::test]
async fn persisting_same_identity_twice_yields_one_row() {
    let db = TestDatabase::new("idempotent").await;
    db.persist(sample_location(1, "First"), &location_options())
        .await
        .unwrap();
    db.persist(sample_location(1, "Second"), &location_options())
        .await
        .unwrap();

    let rows = db
        .read_page("Location", &PageQuery::disabled(), None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    // Last write wins.
    assert_eq!(rows[0]["name"], json!("Second"));
}

#[tokio::test]
async fn linked_persist_scenario() {
    let (db, engine) = db_with_engine("linked-scenario").await;

    db.persist(
        json!({"@id": "/api/locations/1", "name": "Test"}),
        &location_options(),
    )
    .await
    .unwrap();
    db.persist(
        json!({
            "id": "p1",
            "location": {"@id": "/api/locations/1", "name": "Test"}
        }),
        &person_options(),
    )
    .await
    .unwrap();

    // Location has one row keyed "1".
    let location = engine.get("Location", "1").await.unwrap().unwrap();
    assert_eq!(
        location,
        json!({"__pkey__": "1", "@id": "/api/locations/1", "name": "Test"})
    );

    // The Person row embeds the tagged copy before tag-stripping.
    let person = engine.get("Person", "p1").await.unwrap().unwrap();
    assert_eq!(
        person["location"],
        json!({
            "__pkey__": "1",
            "__store__": "Location",
            "@id": "/api/locations/1",
            "name": "Test"
        })
    );

    // And the plain shape after stripping.
    let cleaned = db
        .read_by_key("Person", &KeyQuery::single("p1"))
        .await
        .unwrap();
    assert_eq!(
        cleaned["location"],
        json!({"@id": "/api/locations/1", "name": "Test"})
    );
}

#[tokio::test]
async fn persist_reports_cover_touched_stores() {
    let db = TestDatabase::new("reports").await;
    let reports = db
        .persist(
            sample_person("p1", "Ada", sample_location(1, "Test")),
            &person_options(),
        )
        .await
        .unwrap();

    let names: Vec<&str> = reports.iter().map(|r| r.store_name.as_str()).collect();
    assert_eq!(names, vec!["Person", "Location"]);
    assert!(reports.iter().all(|r| r.rows_written == 1));

    let person_report = &reports[0];
    assert!(person_report
        .index_names
        .iter()
        .any(|name| name == "location.__pkey__"));
    assert!(person_report.index_names.iter().any(|name| name == "name"));
}

#[tokio::test]
async fn read_by_key_reattaches_from_linked_store() {
    let db = TestDatabase::new("reattach").await;
    db.persist(
        sample_person("p1", "Ada", sample_location(1, "Test")),
        &person_options(),
    )
    .await
    .unwrap();

    // The Location row changes independently of the Person row.
    db.persist(sample_location(1, "Renamed"), &location_options())
        .await
        .unwrap();

    let person = db
        .read_by_key("Person", &KeyQuery::single("p1"))
        .await
        .unwrap();
    assert_eq!(person["location"]["name"], json!("Renamed"));
}

#[tokio::test]
async fn rewriting_a_child_relinks_stored_ancestors() {
    let (db, engine) = db_with_engine("relink").await;
    db.persist(
        sample_person("p1", "Ada", sample_location(1, "Test")),
        &person_options(),
    )
    .await
    .unwrap();

    db.persist(sample_location(1, "Updated"), &location_options())
        .await
        .unwrap();

    // The stored Person row itself was rewritten, not just the read view.
    let person = engine.get("Person", "p1").await.unwrap().unwrap();
    assert_eq!(person["location"]["name"], json!("Updated"));
    assert_eq!(person["location"]["__store__"], json!("Location"));
}

#[tokio::test]
async fn relink_walks_two_ancestor_levels() {
    let (db, engine) = db_with_engine("relink-deep").await;
    db.persist(
        sample_school_class("c1", sample_person("p1", "Ada", sample_location(1, "Test"))),
        &school_class_options(),
    )
    .await
    .unwrap();

    db.persist(sample_location(1, "Updated"), &location_options())
        .await
        .unwrap();

    let class = engine.get("SchoolClass", "c1").await.unwrap().unwrap();
    assert_eq!(class["person"]["location"]["name"], json!("Updated"));
}

#[tokio::test]
async fn delete_with_default_keep_leaves_ancestors_untouched() {
    let (db, engine) = db_with_engine("keep").await;
    db.persist(
        sample_person("p1", "Ada", sample_location(1, "Test")),
        &person_options(),
    )
    .await
    .unwrap();

    let reports = db
        .delete_rows("Location", &["1".to_string()])
        .await
        .unwrap();

    // Only the targeted store is affected.
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].store_name, "Location");
    assert_eq!(reports[0].primary_keys, vec!["1".to_string()]);

    let person = engine.get("Person", "p1").await.unwrap().unwrap();
    assert_eq!(person["location"]["name"], json!("Test"));
}

#[tokio::test]
async fn cascade_delete_removes_embedded_property() {
    let (db, engine) = db_with_engine("cascade-delete").await;
    let options = StoreOptions::new("Person", "id")
        .cascade(CascadeType::Delete)
        .linked_key("location", location_options());
    db.persist(
        sample_person("p1", "Ada", sample_location(1, "Test")),
        &options,
    )
    .await
    .unwrap();

    let reports = db
        .delete_rows("Location", &["1".to_string()])
        .await
        .unwrap();

    let person_report = reports.iter().find(|r| r.store_name == "Person").unwrap();
    assert_eq!(person_report.path, "location");
    assert_eq!(person_report.cascade, CascadeType::Delete);
    assert_eq!(person_report.primary_keys, vec!["p1".to_string()]);

    let person = engine.get("Person", "p1").await.unwrap().unwrap();
    assert!(person.get("location").is_none());
}

#[tokio::test]
async fn cascade_null_overwrites_embedded_property() {
    let (db, engine) = db_with_engine("cascade-null").await;
    let options = StoreOptions::new("Person", "id")
        .cascade(CascadeType::Null)
        .linked_key("location", location_options());
    db.persist(
        sample_person("p1", "Ada", sample_location(1, "Test")),
        &options,
    )
    .await
    .unwrap();

    db.delete_rows("Location", &["1".to_string()]).await.unwrap();

    let person = engine.get("Person", "p1").await.unwrap().unwrap();
    assert_eq!(person["location"], Value::Null);
}

#[tokio::test]
async fn cascade_walks_multiple_ancestor_levels() {
    let (db, engine) = db_with_engine("cascade-deep").await;
    let person = StoreOptions::new("Person", "id")
        .cascade(CascadeType::Delete)
        .linked_key("location", location_options());
    let class = StoreOptions::new("SchoolClass", "id")
        .cascade(CascadeType::Null)
        .linked_key("person", person);
    db.persist(
        sample_school_class("c1", sample_person("p1", "Ada", sample_location(1, "Test"))),
        &class,
    )
    .await
    .unwrap();

    let reports = db
        .delete_rows("Location", &["1".to_string()])
        .await
        .unwrap();

    // Nearest ancestor first, each at its accumulated path.
    let person_report = reports.iter().find(|r| r.store_name == "Person").unwrap();
    assert_eq!(person_report.path, "location");
    let class_report = reports
        .iter()
        .find(|r| r.store_name == "SchoolClass")
        .unwrap();
    assert_eq!(class_report.path, "person.location");
    assert_eq!(class_report.cascade, CascadeType::Null);

    let stored_person = engine.get("Person", "p1").await.unwrap().unwrap();
    assert!(stored_person.get("location").is_none());
    let stored_class = engine.get("SchoolClass", "c1").await.unwrap().unwrap();
    assert_eq!(stored_class["person"]["location"], Value::Null);
}

#[tokio::test]
async fn drop_store_prunes_registry_and_traversing_indices() {
    let (db, engine) = db_with_engine("drop").await;
    let options = StoreOptions::new("Person", "id").linked_key("location", location_options());
    db.persist(
        sample_person("p1", "Ada", sample_location(1, "Test")),
        &options,
    )
    .await
    .unwrap();

    let before = engine.index_names("Person").await.unwrap();
    assert!(before.iter().any(|name| name.starts_with("location.")));

    db.drop_stores(&["Location".to_string()], CascadeType::Delete)
        .await
        .unwrap();

    // The store is gone from engine and registry.
    assert!(matches!(
        engine.get("Location", "1").await,
        Err(EngineError::StoreNotFound { .. })
    ));
    let result = db.read_page("Location", &PageQuery::disabled(), None).await;
    assert!(matches!(result, Err(CoreError::StoreNotRegistered { .. })));

    // Indices whose paths traverse the dropped store are cleaned up.
    let after = engine.index_names("Person").await.unwrap();
    assert!(!after.iter().any(|name| name.starts_with("location.")));

    // And ancestor rows were pruned.
    let person = engine.get("Person", "p1").await.unwrap().unwrap();
    assert!(person.get("location").is_none());
}

#[tokio::test]
async fn drop_with_keep_is_structural_only() {
    let (db, engine) = db_with_engine("drop-keep").await;
    db.persist(
        sample_person("p1", "Ada", sample_location(1, "Test")),
        &person_options(),
    )
    .await
    .unwrap();

    db.drop_stores(&["Location".to_string()], CascadeType::Keep)
        .await
        .unwrap();

    let person = engine.get("Person", "p1").await.unwrap().unwrap();
    assert_eq!(person["location"]["name"], json!("Test"));
    assert!(matches!(
        engine.get("Location", "1").await,
        Err(EngineError::StoreNotFound { .. })
    ));
}

#[tokio::test]
async fn pagination_boundaries() {
    let db = TestDatabase::new("pagination").await;
    let rows: Vec<Value> = (1..=7)
        .map(|n| json!({"@id": format!("/api/locations/{n}"), "rank": n}))
        .collect();
    db.persist(Value::Array(rows), &location_options())
        .await
        .unwrap();

    let sort = SortSpec::ascending("rank");
    let first = db
        .read_page("Location", &PageQuery::new(1, 3), Some(&sort))
        .await
        .unwrap();
    assert_eq!(first.len(), 3);
    assert_eq!(first[0]["rank"], json!(1));

    let last = db
        .read_page("Location", &PageQuery::new(3, 3), Some(&sort))
        .await
        .unwrap();
    assert_eq!(last.len(), 1);
    assert_eq!(last[0]["rank"], json!(7));

    assert_eq!(db.result_count("Location"), Some(7));
}

#[tokio::test]
async fn search_is_case_insensitive_over_nested_paths() {
    let db = TestDatabase::new("search").await;
    db.persist(
        json!([
            {"@id": "/api/locations/1", "a": {"b": "Foobar"}},
            {"@id": "/api/locations/2", "a": {"b": "other"}}
        ]),
        &location_options(),
    )
    .await
    .unwrap();

    let hits = db
        .search("Location", &SearchQuery::new("foo", "a.b"), None, None)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["a"]["b"], json!("Foobar"));
    assert_eq!(db.result_count("Location"), Some(1));
}

#[tokio::test]
async fn search_limit_caps_results_but_not_the_counter() {
    let db = TestDatabase::new("search-limit").await;
    db.persist(
        json!([
            {"@id": "/api/locations/1", "name": "Foo One"},
            {"@id": "/api/locations/2", "name": "Foo Two"},
            {"@id": "/api/locations/3", "name": "Foo Three"}
        ]),
        &location_options(),
    )
    .await
    .unwrap();

    let hits = db
        .search(
            "Location",
            &SearchQuery::new("foo", "name").limit(1),
            None,
            Some(&SortSpec::ascending("@id")),
        )
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(db.result_count("Location"), Some(3));
}

#[tokio::test]
async fn filter_runs_over_sorted_cleaned_content() {
    let db = TestDatabase::new("filter").await;
    db.persist(
        json!([
            {"@id": "/api/locations/1", "rank": 3},
            {"@id": "/api/locations/2", "rank": 1},
            {"@id": "/api/locations/3", "rank": 2}
        ]),
        &location_options(),
    )
    .await
    .unwrap();

    let hits = db
        .filter(
            "Location",
            |row| row["rank"].as_i64().unwrap_or(0) >= 2,
            None,
            Some(&SortSpec::ascending("rank")),
        )
        .await
        .unwrap();
    let ranks: Vec<i64> = hits.iter().map(|r| r["rank"].as_i64().unwrap()).collect();
    assert_eq!(ranks, vec![2, 3]);
    // No internal tags leak through.
    assert!(hits.iter().all(|r| r.get("__pkey__").is_none()));
}

#[tokio::test]
async fn trigger_lookup_by_parameter() {
    let db = TestDatabase::new("trigger-param").await;
    let options = StoreOptions::new("Person", "id").trigger(Trigger::new(
        "byCity",
        vec![TriggerRule::param("address.city", "city")],
    ));
    db.persist(
        json!([
            {"id": "p1", "name": "Ada", "address": {"city": "Berlin"}},
            {"id": "p2", "name": "Bob", "address": {"city": "Hamburg"}},
            {"id": "p3", "name": "Cleo", "address": {"city": "Berlin"}}
        ]),
        &options,
    )
    .await
    .unwrap();

    let request = RequestContext::new("/api/people").param("city", "Berlin");
    let hits = db
        .read_by_trigger(
            "Person",
            "byCity",
            &request,
            Some(&SortSpec::ascending("name")),
            None,
        )
        .await
        .unwrap();

    let names: Vec<&str> = hits.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Ada", "Cleo"]);
    assert_eq!(db.result_count("Person"), Some(2));
}

#[tokio::test]
async fn trigger_uuid_path_segment_lookup() {
    let db = TestDatabase::new("trigger-path").await;
    let id = "c7f1bffa-3f6a-4c1d-9c1e-2b8f6a0d4e21";
    let options = StoreOptions::new("Person", "id").trigger(Trigger::new(
        "byId",
        vec![TriggerRule::path_id("__pkey__", 2)],
    ));
    db.persist(
        json!([{"id": id, "name": "Ada"}, {"id": "p2", "name": "Bob"}]),
        &options,
    )
    .await
    .unwrap();

    let request = RequestContext::new(format!("/api/people/{id}"));
    let hits = db
        .read_by_trigger("Person", "byId", &request, None, None)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["name"], json!("Ada"));
}

#[tokio::test]
async fn trigger_search_rule_filters_by_substring() {
    let db = TestDatabase::new("trigger-search").await;
    let options = StoreOptions::new("Person", "id").trigger(Trigger::new(
        "cityAndName",
        vec![
            TriggerRule::param("address.city", "city"),
            TriggerRule::param("name", "q").search(),
        ],
    ));
    db.persist(
        json!([
            {"id": "p1", "name": "Ada", "address": {"city": "Berlin"}},
            {"id": "p2", "name": "Bob", "address": {"city": "Berlin"}},
            {"id": "p3", "name": "Adrian", "address": {"city": "Hamburg"}}
        ]),
        &options,
    )
    .await
    .unwrap();

    let request = RequestContext::new("/api/people")
        .param("city", "Berlin")
        .param("q", "ad");
    let hits = db
        .read_by_trigger("Person", "cityAndName", &request, None, None)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["name"], json!("Ada"));
}

#[tokio::test]
async fn missing_trigger_is_a_fault() {
    let db = TestDatabase::new("trigger-missing").await;
    db.persist(sample_location(1, "Test"), &location_options())
        .await
        .unwrap();

    let result = db
        .read_by_trigger("Location", "nope", &RequestContext::new("/"), None, None)
        .await;
    assert!(matches!(result, Err(CoreError::TriggerNotFound { .. })));
}

#[tokio::test]
async fn missing_primary_key_is_a_fault() {
    let db = TestDatabase::new("pk-missing").await;
    let result = db
        .persist(json!({"name": "no id"}), &location_options())
        .await;
    assert!(matches!(
        result,
        Err(CoreError::PrimaryKeyMissing { ref store, ref key }) if store == "Location" && key == "@id"
    ));
}

#[tokio::test]
async fn partial_failure_keeps_committed_rows() {
    let (db, engine) = db_with_engine("partial").await;
    let options = StoreOptions::new("Person", "id").unique_keys(["email"]);

    let result = db
        .persist(
            json!([
                {"id": "p1", "email": "a@x.io"},
                {"id": "p2", "email": "a@x.io"}
            ]),
            &options,
        )
        .await;

    match result {
        Err(CoreError::Engine(EngineError::TransactionFailed { store, messages })) => {
            assert_eq!(store, "Person");
            assert_eq!(messages.len(), 1);
        }
        other => panic!("expected TransactionFailed, got {other:?}"),
    }

    // The first row stayed committed; no rollback.
    assert!(engine.get("Person", "p1").await.unwrap().is_some());
    assert!(engine.get("Person", "p2").await.unwrap().is_none());
}

#[tokio::test]
async fn add_generates_absent_fields_and_returns_cleaned_rows() {
    let db = TestDatabase::new("add").await;
    db.persist(json!([]), &location_options()).await.unwrap();

    let mut template = ValueTemplateMap::new();
    template.insert(
        "name".to_string(),
        ValueTemplate::Fixed {
            value: json!("Generated"),
        },
    );

    let added = db
        .add(
            "Location",
            json!({"@id": "/api/locations/9"}),
            Some(&template),
        )
        .await
        .unwrap();
    assert_eq!(
        added,
        json!({"@id": "/api/locations/9", "name": "Generated"})
    );
}

#[tokio::test]
async fn add_to_unregistered_store_is_a_fault() {
    let db = TestDatabase::new("add-unregistered").await;
    let result = db.add("Nope", json!({"id": "1"}), None).await;
    assert!(matches!(result, Err(CoreError::StoreNotRegistered { .. })));
}

#[tokio::test]
async fn update_requires_existing_identity() {
    let db = TestDatabase::new("update").await;
    db.persist(sample_location(1, "Test"), &location_options())
        .await
        .unwrap();

    let updated = db
        .update(
            "Location",
            json!({"@id": "/api/locations/1", "name": "Renamed"}),
        )
        .await
        .unwrap();
    assert_eq!(updated["name"], json!("Renamed"));

    let missing = db
        .update(
            "Location",
            json!({"@id": "/api/locations/404", "name": "Ghost"}),
        )
        .await;
    assert!(matches!(missing, Err(CoreError::EntityNotFound { .. })));
}

#[tokio::test]
async fn structure_only_store_commits_no_rows() {
    let (db, engine) = db_with_engine("structure-only").await;
    let options = StoreOptions::new("Location", "@id").structure_only();

    let reports = db
        .persist(sample_location(1, "Test"), &options)
        .await
        .unwrap();
    assert_eq!(reports[0].rows_written, 0);
    // Structure exists, inferred from the sample content.
    assert!(reports[0].index_names.iter().any(|name| name == "name"));
    assert_eq!(engine.count("Location").await.unwrap(), 0);
}

#[tokio::test]
async fn multi_key_read_skips_missing_keys() {
    let db = TestDatabase::new("multi-key").await;
    db.persist(
        json!([
            {"@id": "/api/locations/1", "name": "One"},
            {"@id": "/api/locations/2", "name": "Two"}
        ]),
        &location_options(),
    )
    .await
    .unwrap();

    let result = db
        .read_by_key("Location", &KeyQuery::many(["1", "404", "2"]))
        .await
        .unwrap();
    let names: Vec<&str> = result
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["One", "Two"]);
}

#[tokio::test]
async fn read_by_named_index() {
    let db = TestDatabase::new("by-index").await;
    db.persist(
        json!([
            {"@id": "/api/locations/1", "name": "Alpha"},
            {"@id": "/api/locations/2", "name": "Beta"}
        ]),
        &location_options(),
    )
    .await
    .unwrap();

    let hit = db
        .read_by_key("Location", &KeyQuery::single("Beta").via_index("name"))
        .await
        .unwrap();
    assert_eq!(hit["@id"], json!("/api/locations/2"));
}

#[tokio::test]
async fn clear_empties_without_structural_change() {
    let db = TestDatabase::new("clear").await;
    db.persist(sample_location(1, "Test"), &location_options())
        .await
        .unwrap();

    assert!(db.clear("Location").await.unwrap());
    let rows = db
        .read_page("Location", &PageQuery::disabled(), None)
        .await
        .unwrap();
    assert!(rows.is_empty());

    assert!(!db.clear("NeverExisted").await.unwrap());
}

#[tokio::test]
async fn settings_survive_reinitialization() {
    use mimicdb_core::FileSidecar;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let sidecar_path = dir.path().join("settings.json");
    let engine = Arc::new(MemoryEngine::new());

    {
        let sidecar = FileSidecar::open(&sidecar_path).unwrap();
        let db = Database::open(
            Config::new().database_name("durable"),
            engine.clone(),
            Box::new(sidecar),
        )
        .await
        .unwrap();
        db.persist(
            sample_person("p1", "Ada", sample_location(1, "Test")),
            &person_options(),
        )
        .await
        .unwrap();
        db.close().await;
    }

    // Same engine instance, fresh handle: options and rows are back.
    {
        let sidecar = FileSidecar::open(&sidecar_path).unwrap();
        let db = Database::open(
            Config::new().database_name("durable"),
            engine.clone(),
            Box::new(sidecar),
        )
        .await
        .unwrap();
        let person = db
            .read_by_key("Person", &KeyQuery::single("p1"))
            .await
            .unwrap();
        assert_eq!(person["location"]["name"], json!("Test"));
        db.close().await;
    }

    // Fresh engine: the structural map rebuilds empty stores and indices.
    {
        let sidecar = FileSidecar::open(&sidecar_path).unwrap();
        let fresh_engine = Arc::new(MemoryEngine::new());
        let db = Database::open(
            Config::new().database_name("durable"),
            fresh_engine.clone(),
            Box::new(sidecar),
        )
        .await
        .unwrap();
        let rows = db
            .read_page("Person", &PageQuery::disabled(), None)
            .await
            .unwrap();
        assert!(rows.is_empty());
        assert!(fresh_engine
            .index_names("Person")
            .await
            .unwrap()
            .iter()
            .any(|name| name == "location.__pkey__"));
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        // Round-trip law: any flat entity comes back intact and untagged.
        #[test]
        fn round_trip_law(key in "[a-z]{1,8}", name in "[A-Za-z ]{0,12}", age in 0i64..120) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let db = Database::open_in_memory("prop-round-trip").await.unwrap();
                let entity = json!({"id": key, "name": name, "age": age});
                db.persist(entity.clone(), &StoreOptions::new("Thing", "id"))
                    .await
                    .unwrap();
                let read = db
                    .read_by_key("Thing", &KeyQuery::single(key.clone()))
                    .await
                    .unwrap();
                assert_eq!(read, entity);
            });
        }
    }
}
