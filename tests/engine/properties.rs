//! Property tests for ids, filters and nearest-neighbor ordering.

use proptest::prelude::*;

use crate::common::*;

fn squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn inserted_records_get_ids_one_to_n(ages in prop::collection::vec(0i64..100, 0..40)) {
        let schema = person_schema();
        let mut engine = LocalEngine::new();
        for age in &ages {
            engine.insert(person(&schema, "p", *age, [0.0, 0.0])).unwrap();
        }
        let all = engine.collection(&schema).unwrap().all().unwrap();
        let expected: Vec<u64> = (1..=ages.len() as u64).collect();
        prop_assert_eq!(ids(&all), expected);
    }

    #[test]
    fn ids_never_repeat_after_deletes(
        ops in prop::collection::vec(prop::bool::weighted(0.7), 1..60),
    ) {
        let schema = person_schema();
        let mut engine = LocalEngine::new();
        let mut issued = Vec::new();
        for insert in ops {
            if insert || issued.is_empty() {
                let id = engine.insert(person(&schema, "p", 1, [0.0, 0.0])).unwrap();
                prop_assert!(issued.iter().all(|prev| *prev < id));
                issued.push(id);
            } else {
                let all = engine.collection(&schema).unwrap().all().unwrap();
                if let Some(first) = all.first() {
                    engine.delete(DeleteTarget::from(first)).unwrap();
                }
            }
        }
    }

    #[test]
    fn comparison_filters_partition(
        ages in prop::collection::vec(0i64..50, 1..40),
        pivot in 0i64..50,
    ) {
        let schema = person_schema();
        let mut engine = LocalEngine::new();
        for age in &ages {
            engine.insert(person(&schema, "p", *age, [0.0, 0.0])).unwrap();
        }
        let age = schema.field("age").unwrap();
        let count = |f: affine::Filter| {
            engine.query("person", &FilterSet::from(f), None, None, true).unwrap().len()
        };
        let lt = count(age.lt(pivot).unwrap());
        let eq = count(age.eq(pivot).unwrap());
        let gt = count(age.gt(pivot).unwrap());
        prop_assert_eq!(lt + eq + gt, ages.len());
        prop_assert_eq!(count(age.lte(pivot).unwrap()), lt + eq);
        prop_assert_eq!(count(age.gte(pivot).unwrap()), gt + eq);

        let none = engine
            .query("person", &age.lt(pivot).unwrap().and(age.gte(pivot).unwrap()).unwrap(), None, None, true)
            .unwrap();
        prop_assert!(none.is_empty());
    }

    #[test]
    fn limit_one_is_the_nearest(
        points in prop::collection::vec((-100i32..100, -100i32..100), 1..30),
        qx in -100i32..100,
        qy in -100i32..100,
    ) {
        let schema = person_schema();
        let mut engine = LocalEngine::new();
        for (x, y) in &points {
            engine.insert(person(&schema, "p", 0, [*x as f32, *y as f32])).unwrap();
        }
        let query = [qx as f32, qy as f32];
        let sim = schema.field("embedding").unwrap().similar_to(query.to_vec()).unwrap();
        let ranked = engine
            .query("person", &FilterSet::new("person"), Some(&sim), None, true)
            .unwrap();
        prop_assert_eq!(ranked.len(), points.len());

        let distances: Vec<f32> = ranked
            .iter()
            .map(|r| squared(r.vector("embedding").unwrap(), &query))
            .collect();
        prop_assert!(distances.windows(2).all(|w| w[0] <= w[1]));

        let best = engine
            .query("person", &FilterSet::new("person"), Some(&sim), Some(1), true)
            .unwrap();
        prop_assert_eq!(ids(&best), ids(&ranked[..1]));
    }
}
