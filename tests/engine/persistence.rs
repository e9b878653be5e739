//! Whole-store save/load through the snapshot codec.

use std::io::Cursor;

use crate::common::*;
use affine::{decode_from_slice, CollectionSnapshot, SnapshotBody, SnapshotError, SNAPSHOT_MAGIC};
use tempfile::TempDir;

#[test]
fn save_load_reproduces_the_store() {
    let (mut engine, schema) = seeded_engine();
    let docs = doc_schema(3, DistanceMetric::Cosine);
    engine.insert(doc(&docs, "a", 0.25, vec![0.1, -0.2, 0.3])).unwrap();

    let mut buf = Vec::new();
    engine.save(&mut buf).unwrap();

    let mut restored = LocalEngine::new();
    restored.load(&mut Cursor::new(&buf)).unwrap();

    for name in ["person", "doc"] {
        let schema = restored.schema(name).unwrap().clone();
        let before = engine.collection(&schema).unwrap().all().unwrap();
        let after = restored.collection(&schema).unwrap().all().unwrap();
        assert_eq!(before, after);
    }
    assert_eq!(restored.schema("person").map(|s| &**s), Some(&*schema));
}

#[test]
fn vectors_round_trip_bit_exact() {
    init_tracing();
    let schema = doc_schema(4, DistanceMetric::Euclidean);
    let tricky = vec![f32::MIN_POSITIVE, -0.0, 1.0e-38, 0.1 + 0.2];
    let mut engine = LocalEngine::new();
    engine.insert(doc(&schema, "tricky", 0.5, tricky.clone())).unwrap();

    let mut buf = Vec::new();
    engine.save(&mut buf).unwrap();
    let mut restored = LocalEngine::new();
    restored.load(&mut Cursor::new(&buf)).unwrap();

    let record = restored.get_element_by_id("doc", RecordId::new(1)).unwrap();
    let bits: Vec<u32> = record.vector("embedding").unwrap().iter().map(|x| x.to_bits()).collect();
    let expected: Vec<u32> = tricky.iter().map(|x| x.to_bits()).collect();
    assert_eq!(bits, expected);
}

#[test]
fn counters_resume_from_restored_maximum() {
    let (mut engine, schema) = seeded_engine();
    engine.insert(person(&schema, "Ann", 40, [0.0, 0.0])).unwrap();
    engine
        .delete(DeleteTarget::Id {
            collection: "person",
            id: RecordId::new(3),
        })
        .unwrap();
    // counter is 3 but the highest surviving id is 2
    assert_eq!(engine.last_id("person"), 3);

    let mut buf = Vec::new();
    engine.save(&mut buf).unwrap();
    let mut restored = LocalEngine::new();
    restored.load(&mut Cursor::new(&buf)).unwrap();
    assert_eq!(restored.last_id("person"), 2);

    let id = restored.insert(person(&schema, "Bob", 50, [1.0, 1.0])).unwrap();
    assert_eq!(id, RecordId::new(3));
}

#[test]
fn load_replaces_everything() {
    let (engine, _) = seeded_engine();
    let mut buf = Vec::new();
    engine.save(&mut buf).unwrap();

    let docs = doc_schema(2, DistanceMetric::Cosine);
    let mut target = LocalEngine::new();
    target.insert(doc(&docs, "x", 0.1, vec![1.0, 0.0])).unwrap();
    target.load(&mut Cursor::new(&buf)).unwrap();

    assert_eq!(target.collections().collect::<Vec<_>>(), vec!["person"]);
    assert_eq!(target.count("doc"), 0);
    let id = target.insert(doc(&docs, "y", 0.1, vec![0.0, 1.0])).unwrap();
    assert_eq!(id, RecordId::new(1));
}

#[test]
fn empty_store_round_trips() {
    init_tracing();
    let engine = LocalEngine::new();
    let mut buf = Vec::new();
    engine.save(&mut buf).unwrap();
    assert!(buf.starts_with(SNAPSHOT_MAGIC));

    let (mut target, _) = seeded_engine();
    target.load(&mut Cursor::new(&buf)).unwrap();
    assert_eq!(target.collections().count(), 0);
    assert_eq!(target.last_id("person"), 0);
}

#[test]
fn corrupted_snapshot_leaves_state_untouched() {
    let (mut engine, _) = seeded_engine();
    let mut buf = Vec::new();
    engine.save(&mut buf).unwrap();

    let mut flipped = buf.clone();
    let middle = flipped.len() / 2;
    flipped[middle] ^= 0x40;
    let err = engine.load(&mut Cursor::new(&flipped)).unwrap_err();
    assert!(matches!(err, StoreError::Corruption(_)));

    let truncated = &buf[..buf.len() - 3];
    let err = engine.load(&mut Cursor::new(truncated)).unwrap_err();
    assert!(matches!(err, StoreError::Corruption(_) | StoreError::Io(_)));

    assert_eq!(engine.count("person"), 2);
    assert_eq!(engine.last_id("person"), 2);
}

#[test]
fn snapshot_body_lists_collections() {
    let (engine, _) = seeded_engine();
    let mut buf = Vec::new();
    engine.save(&mut buf).unwrap();
    let body = decode_from_slice(&buf).unwrap();
    assert_eq!(body.len(), 1);
    assert_eq!(body.record_count(), 2);

    let err = decode_from_slice(b"nope").unwrap_err();
    assert!(matches!(err, SnapshotError::TooShort { .. }));
}

#[test]
fn file_snapshots_are_atomic_and_reloadable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("store.afsn");

    let (mut engine, schema) = seeded_engine();
    let first = engine.save_to_path(&path).unwrap();
    assert_eq!(first.path, path);
    assert!(!affine::temp_path_for(&path).exists());

    engine.insert(person(&schema, "Ann", 40, [0.0, 0.0])).unwrap();
    let second = engine.save_to_path(&path).unwrap();
    assert!(second.size_bytes > first.size_bytes);

    let mut restored = LocalEngine::new();
    restored.load_from_path(&path).unwrap();
    assert_eq!(restored.count("person"), 3);
    assert_eq!(
        names(&restored.collection(&schema).unwrap().all().unwrap()),
        vec!["John", "Jane", "Ann"]
    );
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let mut engine = LocalEngine::new();
    let err = engine.load_from_path(&dir.path().join("absent.afsn")).unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));
}

#[test]
fn exhausted_id_space_rejects_insert_after_load() {
    init_tracing();
    let schema = person_schema();
    let top = person(&schema, "Max", 60, [0.0, 0.0])
        .with_id(RecordId::new(u64::MAX))
        .unwrap();
    let mut body = SnapshotBody::new();
    body.insert(CollectionSnapshot::capture(&schema, [&top]).unwrap());

    let mut source = LocalEngine::new();
    source.restore(body).unwrap();
    let mut buf = Vec::new();
    source.save(&mut buf).unwrap();

    let mut engine = LocalEngine::new();
    engine.load(&mut Cursor::new(&buf)).unwrap();
    assert_eq!(engine.last_id("person"), u64::MAX);

    let err = engine.insert(person(&schema, "Ann", 40, [1.0, 1.0])).unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument { .. }));
    assert_eq!(engine.count("person"), 1);
    assert_eq!(
        names(&engine.collection(&schema).unwrap().all().unwrap()),
        vec!["Max"]
    );
}
