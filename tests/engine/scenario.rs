//! The person walkthrough: filter, rank, delete.

use crate::common::*;

#[test]
fn filter_rank_delete_walkthrough() {
    let (mut engine, schema) = seeded_engine();
    let age = schema.field("age").unwrap();
    let embedding = schema.field("embedding").unwrap();

    let adults = engine
        .collection(&schema)
        .unwrap()
        .filter(age.gte(25).unwrap())
        .all()
        .unwrap();
    assert_eq!(names(&adults), vec!["Jane"]);

    let nearest = engine
        .collection(&schema)
        .unwrap()
        .similarity(embedding.similar_to(vec![1.8f32, 2.3]).unwrap())
        .limit(1)
        .unwrap();
    assert_eq!(names(&nearest), vec!["Jane"]);

    engine.delete(DeleteTarget::from(&nearest[0])).unwrap();

    let adults = engine
        .collection(&schema)
        .unwrap()
        .filter(age.gte(25).unwrap())
        .all()
        .unwrap();
    assert!(adults.is_empty());
    assert_eq!(names(&engine.collection(&schema).unwrap().all().unwrap()), vec!["John"]);
}

#[test]
fn every_backend_runs_the_walkthrough() {
    init_tracing();
    let schema = person_schema();
    for factory in available_backends() {
        let mut engine = LocalEngine::with_backend(factory.clone()).unwrap();
        engine.insert(person(&schema, "John", 20, [3.0, 0.0])).unwrap();
        engine.insert(person(&schema, "Jane", 30, [1.0, 2.0])).unwrap();

        let nearest = engine
            .collection(&schema)
            .unwrap()
            .similarity(schema.field("embedding").unwrap().similar_to(vec![1.8f32, 2.3]).unwrap())
            .limit(1)
            .unwrap();
        assert_eq!(names(&nearest), vec!["Jane"], "backend {}", factory.name());
    }
}

#[test]
fn get_by_id_through_builder() {
    let (mut engine, schema) = seeded_engine();
    let jane = engine
        .collection(&schema)
        .unwrap()
        .get_by_id(RecordId::new(2))
        .unwrap();
    assert_eq!(jane.get("age"), Some(&Value::Int(30)));
    assert_eq!(jane.vector("embedding"), Some(&[1.0f32, 2.0][..]));
}
