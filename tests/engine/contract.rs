//! The storage-engine contract seen from another implementation.

use std::sync::Arc;

use crate::common::*;
use affine::QueryBuilder;

/// Engine whose lookups return every stored copy of an id
struct DuplicatingEngine {
    records: Vec<Record>,
}

impl StorageEngine for DuplicatingEngine {
    fn register_collection(&mut self, _schema: &Arc<CollectionSchema>) -> StoreResult<()> {
        Ok(())
    }

    fn insert(&mut self, record: Record) -> StoreResult<RecordId> {
        let id = RecordId::new(1);
        self.records.push(record.with_id(id)?);
        Ok(id)
    }

    fn delete(&mut self, target: DeleteTarget<'_>) -> StoreResult<()> {
        let (_, id) = target.resolve()?;
        self.records.retain(|r| r.id() != Some(id));
        Ok(())
    }

    fn get_elements_by_ids(&self, collection: &str, ids: &[RecordId]) -> StoreResult<Vec<Record>> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.collection() == collection && r.id().is_some_and(|id| ids.contains(&id)))
            .cloned()
            .collect())
    }

    fn query(
        &self,
        collection: &str,
        filter_set: &FilterSet,
        _similarity: Option<&Similarity>,
        limit: Option<usize>,
        _with_vectors: bool,
    ) -> StoreResult<Vec<Record>> {
        let matched = filter_set.apply(self.records.iter().filter(|r| r.collection() == collection))?;
        Ok(matched
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}

#[test]
fn ambiguous_lookup_is_multiple_found() {
    let schema = person_schema();
    let mut engine = DuplicatingEngine { records: Vec::new() };
    engine.insert(person(&schema, "John", 20, [3.0, 0.0])).unwrap();
    engine.insert(person(&schema, "Jane", 30, [1.0, 2.0])).unwrap();

    let err = engine.get_element_by_id("person", RecordId::new(1)).unwrap_err();
    match err {
        StoreError::MultipleFound { count, .. } => assert_eq!(count, 2),
        other => panic!("expected MultipleFound, got {:?}", other),
    }
}

#[test]
fn builder_works_over_any_engine() {
    let schema = person_schema();
    let mut engine = DuplicatingEngine { records: Vec::new() };
    engine.insert(person(&schema, "John", 20, [3.0, 0.0])).unwrap();

    let adults = QueryBuilder::new(&engine, &schema)
        .filter(schema.field("age").unwrap().gte(18).unwrap())
        .all()
        .unwrap();
    assert_eq!(names(&adults), vec!["John"]);

    engine.delete(DeleteTarget::Id { collection: "person", id: RecordId::new(1) }).unwrap();
    let err = engine.collection(&schema).unwrap().get_by_id(RecordId::new(1)).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn engines_are_usable_as_trait_objects() {
    let (engine, schema) = seeded_engine();
    let dynamic: &dyn StorageEngine = &engine;
    let all = QueryBuilder::new(dynamic, &schema).limit(1).unwrap();
    assert_eq!(names(&all), vec!["John"]);
}
