//! End-to-end scenarios over large inputs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, LogNormal};
use rankline::index::{format, model};
use rankline::{Dynamic, Static};
use std::collections::BTreeMap;

#[test]
fn dense_million_window_bound() {
    let keys: Vec<u64> = (0..1_000_000).collect();
    let index = Static::new(&keys, 64, 4).unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..10_000 {
        let q = keys[rng.gen_range(0..keys.len())];
        let approx = index.search(&q);

        assert!(approx.hi - approx.lo <= 130);
        let found = keys[approx.lo..approx.hi].binary_search(&q);
        assert!(found.is_ok(), "key {} missing from its window", q);
    }
}

#[test]
fn query_past_maximum_is_empty_at_n() {
    let keys: Vec<u64> = (0..1_000_000).collect();
    let index = Static::new(&keys, 64, 4).unwrap();

    let approx = index.search(&1_000_041);
    assert_eq!(approx.lo, keys.len());
    assert_eq!(approx.hi, keys.len());
    assert_eq!(index.lower_bound(&keys, &1_000_041), keys.len());
}

#[test]
fn segmenter_invariant_on_lognormal_data() {
    let lognormal = LogNormal::new(0.0, 0.5).unwrap();
    let mut rng = StdRng::seed_from_u64(42);

    let mut keys: Vec<u64> = (0..1_000_000)
        .map(|_| (lognormal.sample(&mut rng) * 1_000_000_000.0) as u64)
        .collect();
    keys.sort_unstable();

    let epsilon = 32;
    let segments = model::build_segments(&keys, epsilon);

    let mut seg_idx = 0;
    for (i, &key) in keys.iter().enumerate() {
        if i > 0 && key == keys[i - 1] {
            continue;
        }
        while seg_idx + 1 < segments.len() && segments[seg_idx + 1].key <= key {
            seg_idx += 1;
        }
        let predicted = segments[seg_idx].predict(key);
        let error = (predicted as i64 - i as i64).unsigned_abs() as usize;
        assert!(
            error <= epsilon + 1,
            "error {} above bound at rank {}",
            error,
            i
        );
    }
}

#[test]
fn dynamic_bulk_assign_insert_matches_reference() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut time = 0u64;
    let new_entry = |rng: &mut StdRng, time: &mut u64| {
        *time += 1;
        (rng.gen_range(0..1_000_000_000u32), *time)
    };

    let mut bulk: Vec<(u32, u64)> = (0..1_000_000)
        .map(|_| new_entry(&mut rng, &mut time))
        .collect();
    bulk.sort();

    let mut reference: BTreeMap<u32, u64> = bulk.iter().copied().collect();
    let mut index: Dynamic<u32, u64> = Dynamic::new(64, 4)
        .with_min_indexed_level(10)
        .with_base_capacity(8);
    // Duplicate keys resolve last-wins on both sides.
    index.load_sorted(bulk).unwrap();
    assert_eq!(index.len(), reference.len());

    // Reassign the first 10_000 bulk keys.
    let reassigned: Vec<u32> = reference.keys().take(10_000).copied().collect();
    for &k in &reassigned {
        time += 1;
        index.insert_or_assign(k, time);
        reference.insert(k, time);
    }

    // Insert 10_000 fresh keys.
    for _ in 0..10_000 {
        let (k, v) = new_entry(&mut rng, &mut time);
        index.insert_or_assign(k, v);
        reference.insert(k, v);
    }

    assert_eq!(index.len(), reference.len());

    for &k in reassigned.iter().take(1000) {
        assert_eq!(index.get(&k), reference.get(&k), "stale value for key {}", k);
    }

    let got: Vec<(u32, u64)> = index.iter().map(|(k, v)| (*k, *v)).collect();
    let expected: Vec<(u32, u64)> = reference.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(got, expected);
}

#[test]
fn dynamic_erase_range_iteration() {
    let mut index: Dynamic<u64, u64> = Dynamic::new(16, 4);
    for k in 1..=1000u64 {
        index.insert_or_assign(k, k);
    }
    for k in 10..500u64 {
        index.erase(&k);
    }

    let got: Vec<u64> = index.iter().map(|(k, _)| *k).collect();
    let expected: Vec<u64> = (1..10).chain(500..=1000).collect();
    assert_eq!(got, expected);
    assert_eq!(index.len(), expected.len());
}

#[test]
fn format_roundtrip_random_queries() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut keys: Vec<u64> = (0..500_000).map(|_| rng.r#gen()).collect();
    keys.sort_unstable();
    keys.dedup();

    let index = Static::new(&keys, 32, 8).unwrap();
    let bytes = format::encode(&index, &keys);
    let (reopened, reopened_keys) = format::decode::<u64>(&bytes).unwrap();
    assert_eq!(reopened_keys, keys);

    let lo = keys[0];
    let hi = keys[keys.len() - 1];
    for _ in 0..5000 {
        let q = rng.gen_range(lo..=hi);
        let expected_lb = keys.partition_point(|x| *x < q);
        let expected_ub = keys.partition_point(|x| *x <= q);
        assert_eq!(reopened.lower_bound(&reopened_keys, &q), expected_lb);
        assert_eq!(reopened.upper_bound(&reopened_keys, &q), expected_ub);
    }
}
