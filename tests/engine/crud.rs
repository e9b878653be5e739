//! Insert, delete and id lookups.

use crate::common::*;

#[test]
fn ids_start_at_one_and_increase() {
    init_tracing();
    let schema = person_schema();
    let mut engine = LocalEngine::new();
    for i in 0..5 {
        let id = engine.insert(person(&schema, "p", i, [0.0, 0.0])).unwrap();
        assert_eq!(id, RecordId::new(i as u64 + 1));
    }
    let all = engine.collection(&schema).unwrap().all().unwrap();
    assert_eq!(ids(&all), vec![1, 2, 3, 4, 5]);
}

#[test]
fn ids_are_per_collection() {
    init_tracing();
    let people = person_schema();
    let docs = doc_schema(3, DistanceMetric::Cosine);
    let mut engine = LocalEngine::new();

    engine.insert(person(&people, "John", 20, [3.0, 0.0])).unwrap();
    engine.insert(person(&people, "Jane", 30, [1.0, 2.0])).unwrap();
    let id = engine.insert(doc(&docs, "a", 0.1, vec![1.0, 0.0, 0.0])).unwrap();
    assert_eq!(id, RecordId::new(1));
    assert_eq!(engine.collections().collect::<Vec<_>>(), vec!["doc", "person"]);
}

#[test]
fn deleted_ids_are_not_reused() {
    let (mut engine, schema) = seeded_engine();
    engine
        .delete(DeleteTarget::Id {
            collection: "person",
            id: RecordId::new(2),
        })
        .unwrap();
    let id = engine.insert(person(&schema, "Ann", 40, [0.0, 0.0])).unwrap();
    assert_eq!(id, RecordId::new(3));
    assert_eq!(engine.last_id("person"), 3);
}

#[test]
fn second_delete_is_not_found() {
    let (mut engine, _) = seeded_engine();
    let target = DeleteTarget::Id {
        collection: "person",
        id: RecordId::new(1),
    };
    engine.delete(target).unwrap();
    let err = engine.delete(target).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(engine.count("person"), 1);
}

#[test]
fn delete_removes_exactly_one_record() {
    let (mut engine, schema) = seeded_engine();
    engine.insert(person(&schema, "Ann", 40, [0.0, 0.0])).unwrap();
    engine
        .delete(DeleteTarget::Id {
            collection: "person",
            id: RecordId::new(2),
        })
        .unwrap();
    let rest = engine.collection(&schema).unwrap().all().unwrap();
    assert_eq!(ids(&rest), vec![1, 3]);
}

#[test]
fn delete_unsaved_record_is_invalid() {
    let (mut engine, schema) = seeded_engine();
    let unsaved = person(&schema, "Ghost", 1, [0.0, 0.0]);
    let err = engine.delete(DeleteTarget::Record(&unsaved)).unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument { .. }));
    assert!(err.is_validation_error());
    assert_eq!(engine.count("person"), 2);
}

#[test]
fn reinserting_a_stored_record_is_invalid() {
    let (mut engine, _) = seeded_engine();
    let stored = engine.get_element_by_id("person", RecordId::new(1)).unwrap();
    let err = engine.insert(stored).unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument { .. }));
    assert_eq!(engine.last_id("person"), 2);
}

#[test]
fn records_with_wrong_vector_length_never_reach_the_store() {
    let schema = person_schema();
    let err = schema
        .record()
        .set("name", "Bad")
        .set("age", 1)
        .set("embedding", vec![1.0f32, 2.0, 3.0])
        .build()
        .unwrap_err();
    assert!(matches!(err, StoreError::Schema { .. }));
    assert!(err.to_string().contains("Expected vector of length 2, got 3"));
}

#[test]
fn conflicting_schema_under_same_name_is_rejected() {
    let (mut engine, _) = seeded_engine();
    let other = CollectionSchema::builder("person")
        .field("name", FieldType::String)
        .build()
        .unwrap();
    let record = other.record().set("name", "Impostor").build().unwrap();
    let err = engine.insert(record).unwrap_err();
    assert!(matches!(err, StoreError::Schema { .. }));
    assert_eq!(engine.count("person"), 2);
}

#[test]
fn lookups_return_store_order() {
    let (mut engine, schema) = seeded_engine();
    engine.insert(person(&schema, "Ann", 40, [0.0, 0.0])).unwrap();

    let found = engine
        .get_elements_by_ids("person", &[RecordId::new(3), RecordId::new(1)])
        .unwrap();
    assert_eq!(names(&found), vec!["John", "Ann"]);

    let one = engine.get_element_by_id("person", RecordId::new(3)).unwrap();
    assert_eq!(one.id(), Some(RecordId::new(3)));

    let missing = engine.get_element_by_id("person", RecordId::new(42)).unwrap_err();
    assert!(missing.is_not_found());
}

#[test]
fn filters_partition_by_age() {
    let (mut engine, schema) = seeded_engine();
    engine.insert(person(&schema, "Ann", 40, [0.0, 0.0])).unwrap();
    let age = schema.field("age").unwrap();

    let query = |f: affine::Filter| engine.query("person", &FilterSet::from(f), None, None, true).unwrap();
    assert_eq!(names(&query(age.eq(30).unwrap())), vec!["Jane"]);
    assert_eq!(names(&query(age.gt(30).unwrap())), vec!["Ann"]);
    assert_eq!(names(&query(age.lt(30).unwrap())), vec!["John"]);
    assert_eq!(names(&query(age.lte(30).unwrap())), vec!["John", "Jane"]);
    assert_eq!(names(&query(age.gte(30).unwrap())), vec!["Jane", "Ann"]);
}

#[test]
fn contradictory_filters_match_nothing() {
    let (mut engine, schema) = seeded_engine();
    let age = schema.field("age").unwrap();
    let result = engine
        .collection(&schema)
        .unwrap()
        .filter(age.lt(25).unwrap())
        .filter(age.gte(25).unwrap())
        .all()
        .unwrap();
    assert!(result.is_empty());
}

#[test]
fn string_and_lookup_filters() {
    let (mut engine, schema) = seeded_engine();
    let by_name = engine
        .collection(&schema)
        .unwrap()
        .filter(schema.filter_from_lookup("name", "John").unwrap())
        .all()
        .unwrap();
    assert_eq!(names(&by_name), vec!["John"]);

    let between = engine
        .collection(&schema)
        .unwrap()
        .filter(schema.field("age").unwrap().between(25, 35).unwrap())
        .all()
        .unwrap();
    assert_eq!(names(&between), vec!["Jane"]);
}

#[test]
fn float_and_bool_filters() {
    init_tracing();
    let schema = doc_schema(2, DistanceMetric::Cosine);
    let mut engine = LocalEngine::new();
    engine.insert(doc(&schema, "low", 0.2, vec![1.0, 0.0])).unwrap();
    engine.insert(doc(&schema, "mid", 0.5, vec![0.0, 1.0])).unwrap();
    engine.insert(doc(&schema, "high", 0.9, vec![1.0, 1.0])).unwrap();

    let published = engine
        .collection(&schema)
        .unwrap()
        .filter(schema.field("published").unwrap().eq(true).unwrap())
        .all()
        .unwrap();
    assert_eq!(titles(&published), vec!["mid", "high"]);

    // integers compare against float fields
    let above = engine
        .collection(&schema)
        .unwrap()
        .filter(schema.field("score").unwrap().lt(1).unwrap())
        .filter(schema.field("score").unwrap().gt(0.3).unwrap())
        .all()
        .unwrap();
    assert_eq!(titles(&above), vec!["mid", "high"]);
}
