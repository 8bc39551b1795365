//! Bounded search helpers for the final in-window lookup.

/// Lower edge of the `epsilon` window around a predicted position.
#[inline]
pub fn pgm_sub_eps(pos: usize, eps: usize) -> usize {
    pos.saturating_sub(eps)
}

/// Upper edge of the `epsilon` window around a predicted position.
///
/// The `+ 2` makes the window `2 * eps + 2` wide, absorbing the rounding
/// of both the segment intercept and the prediction itself.
#[inline]
pub fn pgm_add_eps(pos: usize, eps: usize, size: usize) -> usize {
    let upper = pos.saturating_add(eps).saturating_add(2);
    if upper >= size { size } else { upper }
}

/// Branch-free `lower_bound` over `keys[lo..hi]`.
#[inline]
pub fn binary_search_branchless<K: Ord>(keys: &[K], key: &K, lo: usize, hi: usize) -> usize {
    if lo >= hi || lo >= keys.len() {
        return lo;
    }

    let hi = hi.min(keys.len());
    let slice = &keys[lo..hi];

    let mut size = slice.len();
    if size == 0 {
        return lo;
    }

    let mut base = 0usize;
    while size > 1 {
        let half = size / 2;
        let mid = base + half;
        base = if slice[mid] < *key { mid } else { base };
        size -= half;
    }

    let result = base + (slice[base] < *key) as usize;
    lo + result
}

/// Unrolled linear `lower_bound` over `keys[lo..hi]`.
#[inline]
pub fn linear_search<K: Ord>(keys: &[K], key: &K, lo: usize, hi: usize) -> usize {
    let hi = hi.min(keys.len());
    if hi <= lo {
        return lo;
    }

    let slice = &keys[lo..hi];
    let len = slice.len();
    let mut i = 0;

    while i + 4 <= len {
        if slice[i] >= *key {
            return lo + i;
        }
        if slice[i + 1] >= *key {
            return lo + i + 1;
        }
        if slice[i + 2] >= *key {
            return lo + i + 2;
        }
        if slice[i + 3] >= *key {
            return lo + i + 3;
        }
        i += 4;
    }

    while i < len {
        if slice[i] >= *key {
            return lo + i;
        }
        i += 1;
    }

    hi
}

const LINEAR_SEARCH_THRESHOLD: usize = 64;

/// `lower_bound` over `keys[lo..hi]`, picking the scan strategy by window
/// size. Epsilon windows are small, so this usually resolves to the
/// linear scan.
#[inline]
pub fn adaptive_search<K: Ord>(keys: &[K], key: &K, lo: usize, hi: usize) -> usize {
    let hi = hi.min(keys.len());
    if hi <= lo {
        return lo;
    }

    if (hi - lo) <= LINEAR_SEARCH_THRESHOLD {
        return linear_search(keys, key, lo, hi);
    }

    binary_search_branchless(keys, key, lo, hi)
}
