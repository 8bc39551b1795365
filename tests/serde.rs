#![cfg(feature = "serde")]

use rankline::{Dynamic, Static};

#[test]
fn serde_roundtrip_static() {
    let keys: Vec<u64> = (0..1000).collect();
    let index = Static::new(&keys, 64, 4).unwrap();

    let json = serde_json::to_string(&index).unwrap();
    let de: Static<u64> = serde_json::from_str(&json).unwrap();

    assert_eq!(index.len(), de.len());
    assert_eq!(index.height(), de.height());
    assert_eq!(index.segments_count(), de.segments_count());

    for key in [0u64, 10, 500, 999] {
        assert_eq!(index.lower_bound(&keys, &key), de.lower_bound(&keys, &key));
    }
}

#[test]
fn serde_roundtrip_signed_integers() {
    let keys: Vec<i64> = (-500..500).collect();
    let index = Static::new(&keys, 64, 4).unwrap();

    let json = serde_json::to_string(&index).unwrap();
    let de: Static<i64> = serde_json::from_str(&json).unwrap();

    for key in [-500i64, -100, 0, 100, 499] {
        assert_eq!(index.lower_bound(&keys, &key), de.lower_bound(&keys, &key));
    }
}

#[test]
fn serde_roundtrip_dynamic() {
    let mut index: Dynamic<u64, String> = Dynamic::new(16, 4).with_base_capacity(4);
    for i in 0..200u64 {
        index.insert_or_assign(i, format!("v{i}"));
    }
    for i in (0..200u64).step_by(5) {
        index.erase(&i);
    }

    let json = serde_json::to_string(&index).unwrap();
    let de: Dynamic<u64, String> = serde_json::from_str(&json).unwrap();

    assert_eq!(index.len(), de.len());
    for i in 0..200u64 {
        assert_eq!(index.get(&i), de.get(&i), "mismatch at key {}", i);
    }

    let before: Vec<(u64, String)> = index.iter().map(|(k, v)| (*k, v.clone())).collect();
    let after: Vec<(u64, String)> = de.iter().map(|(k, v)| (*k, v.clone())).collect();
    assert_eq!(before, after);
}

#[test]
fn serde_roundtrip_approx_pos() {
    let keys: Vec<u64> = (0..5000).map(|i| i * 2).collect();
    let index = Static::new(&keys, 32, 4).unwrap();

    let approx = index.search(&4000);
    let json = serde_json::to_string(&approx).unwrap();
    let de: rankline::ApproxPos = serde_json::from_str(&json).unwrap();

    assert_eq!(approx, de);
}
