//! # rankline
//!
//! A learned index over sorted numeric keys. Instead of a tree of pivots,
//! the index stores piecewise linear models of the key distribution: for
//! any query it predicts a rank and guarantees the true `lower_bound`
//! position lies within a fixed-width window around it, so a bounded
//! search finishes the lookup in O(log epsilon) steps regardless of input
//! size.
//!
//! ## Quick Start
//!
//! ```rust
//! use rankline::{Static, Dynamic};
//!
//! // Static: index an external sorted slice.
//! let keys: Vec<u64> = (0..10_000).collect();
//! let index = Static::new(&keys, 64, 4).unwrap();
//! assert_eq!(index.lower_bound(&keys, &5000), 5000);
//!
//! // Dynamic: a mutable sorted map with the same machinery inside.
//! let mut map: Dynamic<u64, &str> = Dynamic::new(64, 4);
//! map.insert_or_assign(1, "one");
//! map.insert_or_assign(2, "two");
//! map.erase(&1);
//! assert_eq!(map.get(&2), Some(&"two"));
//! ```
//!
//! ## Index Types
//!
//! - [`Static`]: immutable multi-level index over an external sorted slice
//! - [`Dynamic`]: insert/assign/erase key-value index built as a cascade
//!   of static indexes (requires the `std` feature)
//!
//! A built [`Static`] can be serialized to a compact little-endian byte
//! form with [`index::format`] and reopened later.
//!
//! ## Features
//!
//! - `std` (default): enables [`Dynamic`] and `std::error::Error`
//! - `parallel`: rayon-chunked construction for large inputs
//! - `serde`: serialization of indexes with serde
//!
//! ## Guarantees
//!
//! The error bound `epsilon` is structural, not statistical: every query
//! window is at most `2 * epsilon + 2` positions wide, whatever the key
//! distribution. Construction is a single O(n) pass.

#![cfg_attr(not(feature = "std"), no_std)]
extern crate alloc;

pub mod error;
pub mod index;
pub mod util;

pub use error::Error;

pub use index::Builder;
#[cfg(feature = "std")]
pub use index::Dynamic;
pub use index::key::{F64Key, Key};
pub use index::{Segment, Static};
pub use util::ApproxPos;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn test_integration_basic() {
        let keys: Vec<u64> = (0..10000).collect();
        let index = index::Builder::new()
            .epsilon(64)
            .epsilon_recursive(4)
            .build(&keys)
            .unwrap();

        for i in (0..10000).step_by(100) {
            let pos = index.lower_bound(&keys, &i);
            assert_eq!(pos, i as usize);
        }
    }

    #[test]
    fn test_integration_signed() {
        let keys: Vec<i64> = (-5000..5000).collect();
        let index = Static::new(&keys, 64, 4).unwrap();

        for i in (-5000i64..5000).step_by(100) {
            let pos = index.lower_bound(&keys, &i);
            let expected = (i + 5000) as usize;
            assert_eq!(pos, expected, "failed for key {}", i);
        }

        assert!(index.contains(&keys, &-5000));
        assert!(!index.contains(&keys, &5000));
    }

    #[test]
    fn test_integration_sparse() {
        let keys: Vec<u64> = (0..1000).map(|i| i * i).collect();
        let index = Static::new(&keys, 32, 4).unwrap();

        for (i, &key) in keys.iter().enumerate() {
            let pos = index.lower_bound(&keys, &key);
            assert_eq!(pos, i, "failed for key {} at index {}", key, i);
        }
    }

    #[test]
    fn test_missing_keys() {
        let keys: Vec<u64> = (0..100).map(|i| i * 2).collect();
        let index = Static::new(&keys, 8, 4).unwrap();

        let pos = index.lower_bound(&keys, &1);
        assert_eq!(pos, 1);

        let pos = index.lower_bound(&keys, &199);
        assert_eq!(pos, 100);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_integration_dynamic() {
        let mut map: Dynamic<u64, u64> = Dynamic::new(32, 4);
        for i in 0..1000 {
            map.insert_or_assign(i, i * 2);
        }
        for i in (0..1000).step_by(3) {
            map.erase(&i);
        }

        assert_eq!(map.len(), 1000 - 334);
        assert_eq!(map.get(&4), Some(&8));
        assert_eq!(map.get(&3), None);
    }

    #[test]
    fn test_integration_format_roundtrip() {
        let keys: Vec<u64> = (0..5000).map(|i| i * 11).collect();
        let index = Static::new(&keys, 32, 4).unwrap();

        let bytes = index::format::encode(&index, &keys);
        let (reopened, reopened_keys) = index::format::decode::<u64>(&bytes).unwrap();

        for probe in [0u64, 55, 54_989, 100_000] {
            assert_eq!(
                reopened.lower_bound(&reopened_keys, &probe),
                index.lower_bound(&keys, &probe)
            );
        }
    }
}
