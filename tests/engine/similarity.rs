//! Similarity queries across backends and metrics.

use crate::common::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_docs(engine: &mut LocalEngine, schema: &std::sync::Arc<CollectionSchema>, n: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let dimension = match schema.field("embedding").unwrap().def().field_type {
        FieldType::Vector { dimension, .. } => dimension,
        _ => unreachable!(),
    };
    for i in 0..n {
        let embedding: Vec<f32> = (0..dimension).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let score = (i % 10) as f64 / 10.0;
        engine.insert(doc(schema, &format!("doc-{}", i), score, embedding)).unwrap();
    }
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
}

#[test]
fn limit_returns_k_nearest_in_order() {
    init_tracing();
    let schema = doc_schema(4, DistanceMetric::Euclidean);
    let mut engine = LocalEngine::new();
    random_docs(&mut engine, &schema, 200, 1);

    let query = vec![0.2f32, -0.1, 0.5, 0.0];
    let sim = schema.field("embedding").unwrap().similar_to(query.clone()).unwrap();
    let top = engine
        .query("doc", &FilterSet::new("doc"), Some(&sim), Some(10), true)
        .unwrap();
    assert_eq!(top.len(), 10);

    let distances: Vec<f32> = top
        .iter()
        .map(|r| euclidean(r.vector("embedding").unwrap(), &query))
        .collect();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));

    let everything = engine
        .query("doc", &FilterSet::new("doc"), Some(&sim), None, true)
        .unwrap();
    assert_eq!(everything.len(), 200);
    assert_eq!(ids(&everything[..10]), ids(&top));
    let worst_in_top = distances[9];
    for r in &everything[10..] {
        assert!(euclidean(r.vector("embedding").unwrap(), &query) >= worst_in_top);
    }
}

#[test]
fn exact_backends_agree() {
    init_tracing();
    let schema = doc_schema(3, DistanceMetric::Cosine);
    let query = vec![0.3f32, 0.3, -0.9];
    let sim = schema.field("embedding").unwrap().similar_to(query).unwrap();

    let mut results = Vec::new();
    for factory in available_backends() {
        if matches!(factory, IndexBackendFactory::Hnsw(_)) {
            continue;
        }
        let mut engine = LocalEngine::with_backend(factory).unwrap();
        random_docs(&mut engine, &schema, 300, 2);
        let top = engine
            .query("doc", &FilterSet::new("doc"), Some(&sim), Some(15), true)
            .unwrap();
        results.push(ids(&top));
    }
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn hnsw_recall_is_high() {
    init_tracing();
    let factory = IndexBackendFactory::Hnsw(Default::default());
    if !factory.is_available() {
        return;
    }
    let schema = doc_schema(8, DistanceMetric::Euclidean);
    let mut exact = LocalEngine::new();
    let mut approx = LocalEngine::with_backend(factory).unwrap();
    random_docs(&mut exact, &schema, 500, 3);
    random_docs(&mut approx, &schema, 500, 3);

    let mut rng = StdRng::seed_from_u64(99);
    let mut hits = 0;
    for _ in 0..10 {
        let q: Vec<f32> = (0..8).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let sim = schema.field("embedding").unwrap().similar_to(q).unwrap();
        let truth = ids(&exact.query("doc", &FilterSet::new("doc"), Some(&sim), Some(10), true).unwrap());
        let found = ids(&approx.query("doc", &FilterSet::new("doc"), Some(&sim), Some(10), true).unwrap());
        hits += found.iter().filter(|id| truth.contains(id)).count();
    }
    assert!(hits >= 90, "recall {}/100", hits);
}

#[test]
fn similarity_ranks_only_filtered_candidates() {
    init_tracing();
    let schema = doc_schema(2, DistanceMetric::Euclidean);
    let mut engine = LocalEngine::new();
    engine.insert(doc(&schema, "exact-but-low", 0.1, vec![1.0, 1.0])).unwrap();
    engine.insert(doc(&schema, "near", 0.9, vec![1.1, 1.1])).unwrap();
    engine.insert(doc(&schema, "far", 0.9, vec![-5.0, -5.0])).unwrap();

    let result = engine
        .collection(&schema)
        .unwrap()
        .filter(schema.field("score").unwrap().gte(0.5).unwrap())
        .similarity(schema.field("embedding").unwrap().similar_to(vec![1.0f32, 1.0]).unwrap())
        .limit(1)
        .unwrap();
    assert_eq!(titles(&result), vec!["near"]);
}

#[test]
fn empty_candidates_yield_empty_result() {
    let (mut engine, schema) = seeded_engine();
    let result = engine
        .collection(&schema)
        .unwrap()
        .filter(schema.field("age").unwrap().gt(100).unwrap())
        .similarity(schema.field("embedding").unwrap().similar_to(vec![0.0f32, 0.0]).unwrap())
        .limit(3)
        .unwrap();
    assert!(result.is_empty());
}

#[test]
fn ties_keep_insertion_order() {
    init_tracing();
    let schema = doc_schema(2, DistanceMetric::Euclidean);
    let mut engine = LocalEngine::new();
    for title in ["a", "b", "c", "d"] {
        engine.insert(doc(&schema, title, 0.5, vec![1.0, 0.0])).unwrap();
    }
    let result = engine
        .collection(&schema)
        .unwrap()
        .similarity(schema.field("embedding").unwrap().similar_to(vec![0.0f32, 0.0]).unwrap())
        .limit(3)
        .unwrap();
    assert_eq!(titles(&result), vec!["a", "b", "c"]);
}

#[test]
fn dot_product_prefers_large_aligned_vectors() {
    init_tracing();
    let schema = doc_schema(2, DistanceMetric::DotProduct);
    let mut engine = LocalEngine::new();
    engine.insert(doc(&schema, "small", 0.5, vec![0.9, 0.1])).unwrap();
    engine.insert(doc(&schema, "large", 0.5, vec![10.0, 0.0])).unwrap();
    engine.insert(doc(&schema, "opposite", 0.5, vec![-10.0, 0.0])).unwrap();
    let result = engine
        .collection(&schema)
        .unwrap()
        .similarity(schema.field("embedding").unwrap().similar_to(vec![1.0f32, 0.0]).unwrap())
        .all()
        .unwrap();
    assert_eq!(titles(&result), vec!["large", "small", "opposite"]);
}

#[test]
fn wrong_query_length_is_a_schema_error() {
    let schema = person_schema();
    let err = schema
        .field("embedding")
        .unwrap()
        .similar_to(vec![1.0f32, 2.0, 3.0])
        .unwrap_err();
    assert!(matches!(err, StoreError::Schema { .. }));

    let err = Similarity::new(&schema, "age", vec![1.0f32, 2.0]).unwrap_err();
    assert!(matches!(err, StoreError::Schema { .. }));
}

#[test]
fn two_similarity_criteria_are_rejected() {
    let (mut engine, schema) = seeded_engine();
    let embedding = schema.field("embedding").unwrap();
    let err = engine
        .collection(&schema)
        .unwrap()
        .similarity(embedding.similar_to(vec![0.0f32, 0.0]).unwrap())
        .filter(embedding.similar_to(vec![1.0f32, 1.0]).unwrap())
        .all()
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument { .. }));
}

#[test]
fn similarity_from_another_collection_is_rejected() {
    let (engine, _) = seeded_engine();
    let docs = doc_schema(2, DistanceMetric::Euclidean);
    let sim = docs.field("embedding").unwrap().similar_to(vec![0.0f32, 0.0]).unwrap();
    let err = engine
        .query("person", &FilterSet::new("person"), Some(&sim), None, true)
        .unwrap_err();
    assert!(matches!(err, StoreError::Schema { .. }));
}
