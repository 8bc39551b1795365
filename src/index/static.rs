//! Multi-level recursive learned index.
//!
//! Level 0 is the segmentation of the data itself; each level above it
//! segments the first-keys of the level below, until a level fits in a
//! single root probe. Queries descend from the root, each hop narrowing
//! the candidate segments to an epsilon window.

use alloc::vec;
use alloc::vec::Vec;
use core::ops::RangeBounds;

use crate::error::Error;

use crate::index::Key;
use crate::index::Segment;
use crate::index::model::build_segments;

use crate::util::ApproxPos;
use crate::util::range::range_to_indices;
use crate::util::search::{adaptive_search, pgm_add_eps, pgm_sub_eps};

const LINEAR_SEARCH_THRESHOLD_SEGMENTS: usize = 32;

/// A multi-level recursive learned index over a sorted slice.
///
/// The index stores only the linear models; the keys live outside it and
/// are passed to the query methods. Once built it is immutable, so it can
/// be shared across threads for read-only queries without synchronization.
///
/// # Example
///
/// ```
/// use rankline::Static;
///
/// let keys: Vec<u64> = (0..10000).collect();
/// let index = Static::new(&keys, 64, 4).unwrap();
///
/// assert!(index.contains(&keys, &5000));
/// assert_eq!(index.lower_bound(&keys, &5000), 5000);
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound = "K: serde::Serialize + serde::de::DeserializeOwned")
)]
pub struct Static<K: Key> {
    epsilon: usize,
    epsilon_recursive: usize,
    len: usize,
    first_key: K,
    last_key: K,
    levels_offsets: Vec<usize>,
    segments: Vec<Segment<K>>,
}

impl<K: Key> Static<K> {
    /// Build a new index from a sorted slice.
    ///
    /// `epsilon` bounds the prediction error at the data level (larger
    /// means fewer segments); `epsilon_recursive` bounds it at the upper
    /// levels, with `0` meaning no recursion at all.
    ///
    /// # Errors
    ///
    /// Returns an error if `keys` is empty or `epsilon` is 0.
    pub fn new(keys: &[K], epsilon: usize, epsilon_recursive: usize) -> Result<Self, Error> {
        Self::build_with(keys, epsilon, epsilon_recursive, build_segments)
    }

    #[cfg(feature = "parallel")]
    pub fn new_parallel(
        keys: &[K],
        epsilon: usize,
        epsilon_recursive: usize,
    ) -> Result<Self, Error> {
        use crate::index::model::build_segments_parallel;
        Self::build_with(keys, epsilon, epsilon_recursive, build_segments_parallel)
    }

    fn build_with(
        keys: &[K],
        epsilon: usize,
        epsilon_recursive: usize,
        segment_data: impl Fn(&[K], usize) -> Vec<Segment<K>>,
    ) -> Result<Self, Error> {
        if keys.is_empty() {
            return Err(Error::EmptyInput);
        }
        if epsilon == 0 {
            return Err(Error::InvalidEpsilon);
        }

        debug_assert!(
            keys.windows(2).all(|w| w[0] <= w[1]),
            "keys must be sorted and non-decreasing"
        );

        let bottom_segments = segment_data(keys, epsilon);
        let mut levels: Vec<Vec<Segment<K>>> = vec![bottom_segments];

        while epsilon_recursive > 0 && levels.last().map_or(0, Vec::len) > 1 {
            let prev_level = levels.last().map_or(&[][..], Vec::as_slice);
            let super_keys: Vec<K> = prev_level.iter().map(|s| s.key).collect();
            let upper_segments = build_segments(&super_keys, epsilon_recursive);

            if upper_segments.len() >= prev_level.len() {
                break;
            }

            levels.push(upper_segments);
        }

        let total_segments: usize = levels.iter().map(Vec::len).sum();
        let mut segments = Vec::with_capacity(total_segments);
        let mut levels_offsets = Vec::with_capacity(levels.len() + 1);

        levels_offsets.push(0);
        for level in levels.iter().rev() {
            segments.extend_from_slice(level);
            levels_offsets.push(segments.len());
        }

        Ok(Self {
            epsilon,
            epsilon_recursive,
            len: keys.len(),
            first_key: keys[0],
            last_key: keys[keys.len() - 1],
            levels_offsets,
            segments,
        })
    }

    /// Reassemble an index from decoded parts; used by the persisted
    /// format reader. `levels_offsets` and `segments` are in root-first
    /// layout order.
    pub(crate) fn from_parts(
        epsilon: usize,
        epsilon_recursive: usize,
        len: usize,
        first_key: K,
        last_key: K,
        levels_offsets: Vec<usize>,
        segments: Vec<Segment<K>>,
    ) -> Self {
        Self {
            epsilon,
            epsilon_recursive,
            len,
            first_key,
            last_key,
            levels_offsets,
            segments,
        }
    }

    /// Segments of one layout level; level 0 is the root.
    pub(crate) fn level_segments(&self, level: usize) -> &[Segment<K>] {
        &self.segments[self.levels_offsets[level]..self.levels_offsets[level + 1]]
    }

    #[inline]
    fn search_segment(&self, level: usize, key: &K, lo: usize, hi: usize) -> usize {
        let level_start = self.levels_offsets[level];
        let level_end = self.levels_offsets[level + 1];
        let level_size = level_end - level_start;

        let lo = lo.min(level_size);
        let hi = hi.min(level_size);

        if hi <= lo {
            return lo;
        }

        let abs_lo = level_start + lo;
        let abs_hi = level_start + hi;

        if abs_hi - abs_lo <= LINEAR_SEARCH_THRESHOLD_SEGMENTS {
            let mut idx = abs_lo;
            while idx + 1 < abs_hi && self.segments[idx + 1].key <= *key {
                idx += 1;
            }
            idx - level_start
        } else {
            let slice = &self.segments[abs_lo..abs_hi];
            let pos = slice.partition_point(|s| s.key <= *key);
            let pos = pos.saturating_sub(1);
            lo + pos
        }
    }

    /// Segment-array window around a predicted index at a recursion
    /// level: `[p - eps_r, p + eps_r + 2)`, width `2 * eps_r + 2` before
    /// clamping to the level size.
    #[inline]
    fn segment_window(&self, predicted: usize, size: usize) -> (usize, usize) {
        (
            pgm_sub_eps(predicted, self.epsilon_recursive),
            pgm_add_eps(predicted, self.epsilon_recursive, size),
        )
    }

    /// Approximate position of `key`.
    ///
    /// The returned window `[lo, hi)` contains the `lower_bound` rank of
    /// `key` and is at most `2 * epsilon + 2` wide. Queries below the
    /// smallest indexed key return `{0, 0, 0}`; queries above the largest
    /// return `{n, n, n}`.
    #[inline]
    pub fn search(&self, key: &K) -> ApproxPos {
        if *key < self.first_key {
            return ApproxPos::new(0, 0, 0);
        }
        if *key > self.last_key {
            return ApproxPos::new(self.len, self.len, self.len);
        }

        let num_levels = self.levels_offsets.len() - 1;
        let mut seg_lo = 0usize;
        let mut seg_hi = self.levels_offsets[1];

        for level in 0..num_levels - 1 {
            let level_start = self.levels_offsets[level];
            let level_size = self.levels_offsets[level + 1] - level_start;

            let local_idx = self.search_segment(level, key, seg_lo, seg_hi.min(level_size));
            let segment = &self.segments[level_start + local_idx];

            let next_level_start = self.levels_offsets[level + 1];
            let next_level_size = self.levels_offsets[level + 2] - next_level_start;
            // For keys in the gap before the next segment, its intercept
            // caps the prediction; the segment's own line is only
            // constrained at the keys it covered.
            let mut predicted = segment.predict(*key);
            if local_idx + 1 < level_size {
                let next = &self.segments[level_start + local_idx + 1];
                predicted = predicted.min(next.intercept.max(0) as usize);
            }
            let predicted = predicted.min(next_level_size.saturating_sub(1));

            (seg_lo, seg_hi) = self.segment_window(predicted, next_level_size);
        }

        let bottom_level = num_levels - 1;
        let bottom_start = self.levels_offsets[bottom_level];
        let bottom_size = self.levels_offsets[bottom_level + 1] - bottom_start;

        let local_idx = self.search_segment(bottom_level, key, seg_lo, seg_hi.min(bottom_size));
        let segment = &self.segments[bottom_start + local_idx];

        let mut pos = segment.predict(*key);
        if local_idx + 1 < bottom_size {
            let next = &self.segments[bottom_start + local_idx + 1];
            pos = pos.min(next.intercept.max(0) as usize);
        }
        let pos = pos.min(self.len.saturating_sub(1));
        let lo = pgm_sub_eps(pos, self.epsilon);
        let hi = pgm_add_eps(pos, self.epsilon, self.len);

        ApproxPos::new(pos, lo, hi)
    }

    /// First position in `keys` where `keys[pos] >= key`.
    #[inline]
    pub fn lower_bound(&self, keys: &[K], key: &K) -> usize {
        let approx = self.search(key);
        let len = keys.len();
        if len == 0 {
            return 0;
        }

        let pos = approx.pos.min(len - 1);
        if keys[pos] == *key {
            let mut i = pos;
            while i > 0 && keys[i - 1] == *key {
                i -= 1;
            }
            return i;
        }

        if keys[pos] < *key {
            if pos + 1 < len && keys[pos + 1] >= *key {
                return pos + 1;
            }
        } else if pos > 0 && keys[pos - 1] < *key {
            return pos;
        }

        adaptive_search(keys, key, approx.lo, approx.hi.min(len))
    }

    /// First position in `keys` where `keys[pos] > key`.
    #[inline]
    pub fn upper_bound(&self, keys: &[K], key: &K) -> usize {
        let lb = self.lower_bound(keys, key);
        lb + keys[lb..].partition_point(|x| *x <= *key)
    }

    /// Whether `key` exists in `keys`.
    #[inline]
    pub fn contains(&self, keys: &[K], key: &K) -> bool {
        let approx = self.search(key);
        let len = keys.len();

        if len == 0 {
            return false;
        }

        let pos = approx.pos.min(len - 1);
        if keys[pos] == *key {
            return true;
        }

        let lo = approx.lo;
        let hi = approx.hi.min(len);
        keys[lo..hi].binary_search(key).is_ok()
    }

    /// Number of occurrences of `key` in `keys`.
    #[inline]
    pub fn count(&self, keys: &[K], key: &K) -> usize {
        self.upper_bound(keys, key) - self.lower_bound(keys, key)
    }

    /// Number of elements the index was built for.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of segments across all levels.
    #[inline]
    pub fn segments_count(&self) -> usize {
        self.segments.len()
    }

    /// Number of levels in the index.
    #[inline]
    pub fn height(&self) -> usize {
        self.levels_offsets.len().saturating_sub(1)
    }

    #[inline]
    pub fn epsilon(&self) -> usize {
        self.epsilon
    }

    #[inline]
    pub fn epsilon_recursive(&self) -> usize {
        self.epsilon_recursive
    }

    /// Approximate memory usage in bytes.
    pub fn size_in_bytes(&self) -> usize {
        core::mem::size_of::<Self>()
            + self.segments.capacity() * core::mem::size_of::<Segment<K>>()
            + self.levels_offsets.capacity() * core::mem::size_of::<usize>()
    }

    /// The `(start, end)` indices of `keys` selected by `range`.
    #[inline]
    pub fn range_indices<R>(&self, keys: &[K], range: R) -> (usize, usize)
    where
        R: RangeBounds<K>,
    {
        range_to_indices(
            range,
            keys.len(),
            |k| self.lower_bound(keys, k),
            |k| self.upper_bound(keys, k),
        )
    }

    /// Iterator over the keys selected by `range`.
    #[inline]
    pub fn range<'a, R>(&self, keys: &'a [K], range: R) -> impl DoubleEndedIterator<Item = &'a K>
    where
        R: RangeBounds<K>,
    {
        let (start, end) = self.range_indices(keys, range);
        keys[start..end].iter()
    }
}
