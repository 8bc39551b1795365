//! Streaming piecewise linear approximation.
//!
//! Consumes `(key, rank)` pairs in key order and greedily grows each
//! segment for as long as some line predicts every consumed rank within
//! `epsilon`. Feasibility is tracked geometrically: each point constrains
//! the line to pass between `(x, rank - epsilon)` and `(x, rank + epsilon)`,
//! and the set of lines satisfying all constraints is maintained through
//! the upper and lower convex hulls of those shifted points. A point is
//! accepted or rejected in amortized O(1), so the whole pass is linear and
//! the segment count is the minimum possible for the given `epsilon`.

use alloc::vec;
use alloc::vec::Vec;

use crate::index::{Key, Segment};

#[inline(always)]
fn key_diff<K: Key>(a: K, b: K) -> f64 {
    a.to_f64_fast() - b.to_f64_fast()
}

#[derive(Clone, Copy, Debug, Default)]
struct Point {
    x: f64,
    y: f64,
}

#[inline(always)]
fn slope(a: Point, b: Point) -> f64 {
    (b.y - a.y) / (b.x - a.x)
}

#[inline(always)]
fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Feasibility state for one open segment.
///
/// Coordinates are segment-relative: `x` is the key distance from the
/// segment's first key and `y` the rank distance from its first rank, so
/// magnitudes stay far below the `f64` mantissa limit even for 64-bit
/// keys. `rect` holds the four support points of the two extreme feasible
/// lines: `rect[0] -> rect[2]` is the minimum-slope line, `rect[1] ->
/// rect[3]` the maximum-slope line.
struct SegmentBuilder {
    epsilon: f64,
    points: usize,
    rect: [Point; 4],
    upper: Vec<Point>,
    lower: Vec<Point>,
    upper_start: usize,
    lower_start: usize,
}

impl SegmentBuilder {
    fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            points: 0,
            rect: [Point::default(); 4],
            upper: Vec::new(),
            lower: Vec::new(),
            upper_start: 0,
            lower_start: 0,
        }
    }

    fn reset(&mut self) {
        self.points = 0;
    }

    /// Try to extend the open segment with `(x, y)`; `x` must be strictly
    /// greater than every previously added abscissa.
    fn add_point(&mut self, x: f64, y: f64) -> bool {
        let p1 = Point {
            x,
            y: y + self.epsilon,
        };
        let p2 = Point {
            x,
            y: y - self.epsilon,
        };

        if self.points == 0 {
            self.rect[0] = p1;
            self.rect[1] = p2;
            self.upper.clear();
            self.lower.clear();
            self.upper.push(p1);
            self.lower.push(p2);
            self.upper_start = 0;
            self.lower_start = 0;
            self.points = 1;
            return true;
        }

        if self.points == 1 {
            self.rect[2] = p2;
            self.rect[3] = p1;
            self.upper.push(p1);
            self.lower.push(p2);
            self.points = 2;
            return true;
        }

        let min_slope = slope(self.rect[0], self.rect[2]);
        let max_slope = slope(self.rect[1], self.rect[3]);
        if slope(self.rect[2], p1) < min_slope || slope(self.rect[3], p2) > max_slope {
            return false;
        }

        if slope(self.rect[1], p1) < max_slope {
            // p1 tightens the maximum slope; its support pivots on the
            // lower hull, which is slope-sorted, so scan until the slope
            // to p1 stops decreasing.
            let mut best_i = self.lower_start;
            let mut best = slope(self.lower[best_i], p1);
            for i in self.lower_start + 1..self.lower.len() {
                let val = slope(self.lower[i], p1);
                if val > best {
                    break;
                }
                best = val;
                best_i = i;
            }
            self.rect[1] = self.lower[best_i];
            self.rect[3] = p1;
            self.lower_start = best_i;

            let mut end = self.upper.len();
            while end >= self.upper_start + 2
                && cross(self.upper[end - 2], self.upper[end - 1], p1) <= 0.0
            {
                end -= 1;
            }
            self.upper.truncate(end);
            self.upper.push(p1);
        }

        if slope(self.rect[0], p2) > min_slope {
            // Symmetric case: p2 tightens the minimum slope against the
            // upper hull.
            let mut best_i = self.upper_start;
            let mut best = slope(self.upper[best_i], p2);
            for i in self.upper_start + 1..self.upper.len() {
                let val = slope(self.upper[i], p2);
                if val < best {
                    break;
                }
                best = val;
                best_i = i;
            }
            self.rect[0] = self.upper[best_i];
            self.rect[2] = p2;
            self.upper_start = best_i;

            let mut end = self.lower.len();
            while end >= self.lower_start + 2
                && cross(self.lower[end - 2], self.lower[end - 1], p2) >= 0.0
            {
                end -= 1;
            }
            self.lower.truncate(end);
            self.lower.push(p2);
        }

        self.points += 1;
        true
    }

    /// Close the open segment: midpoint of the feasible slope interval,
    /// intercept read off the intersection of the two extreme lines.
    fn close(&self) -> (f64, f64) {
        if self.points == 1 {
            return (0.0, (self.rect[0].y + self.rect[1].y) / 2.0);
        }

        let min_slope = slope(self.rect[0], self.rect[2]);
        let max_slope = slope(self.rect[1], self.rect[3]);
        let mut mid = (min_slope + max_slope) / 2.0;
        if mid < 0.0 && max_slope >= 0.0 {
            // A rank function never decreases; take the flat line when the
            // feasible interval allows it, so predictions stay monotone
            // across the gap to the next segment.
            mid = 0.0;
        }

        let d1x = self.rect[2].x - self.rect[0].x;
        let d1y = self.rect[2].y - self.rect[0].y;
        let d2x = self.rect[3].x - self.rect[1].x;
        let d2y = self.rect[3].y - self.rect[1].y;
        let denom = d1x * d2y - d1y * d2x;

        let (ix, iy) = if denom == 0.0 {
            // Parallel extremes: the interval is a single slope and any
            // point of either line works as the anchor.
            (self.rect[0].x, self.rect[0].y)
        } else {
            let t = ((self.rect[1].x - self.rect[0].x) * d2y
                - (self.rect[1].y - self.rect[0].y) * d2x)
                / denom;
            (self.rect[0].x + t * d1x, self.rect[0].y + t * d1y)
        };

        (mid, iy - ix * mid)
    }
}

fn emit<K: Key>(builder: &SegmentBuilder, first: K, start: usize) -> Segment<K> {
    let (slope, local_intercept) = builder.close();
    let intercept = crate::index::segment::round_to_i64(local_intercept) + start as i64;
    Segment::new(first, slope, intercept)
}

/// Segment sorted `keys` so that every key's predicted rank is within
/// `epsilon` of its true rank. Runs of equal keys are collapsed to their
/// first occurrence.
pub fn build_segments<K: Key>(keys: &[K], epsilon: usize) -> Vec<Segment<K>> {
    build_segments_offset(keys, epsilon, 0)
}

fn build_segments_offset<K: Key>(keys: &[K], epsilon: usize, offset: usize) -> Vec<Segment<K>> {
    if keys.is_empty() {
        return Vec::new();
    }
    if keys.len() == 1 {
        return vec![Segment::new(keys[0], 0.0, offset as i64)];
    }

    let mut segments = Vec::with_capacity(keys.len() / (2 * epsilon.max(1)) + 1);
    let mut builder = SegmentBuilder::new(epsilon as f64);
    let mut seg_first = keys[0];
    let mut seg_start = 0usize;
    builder.add_point(0.0, 0.0);

    for (i, &key) in keys.iter().enumerate().skip(1) {
        if key == keys[i - 1] {
            continue;
        }
        let x = key_diff(key, seg_first);
        let y = (i - seg_start) as f64;
        if !builder.add_point(x, y) {
            segments.push(emit(&builder, seg_first, offset + seg_start));
            seg_first = key;
            seg_start = i;
            builder.reset();
            builder.add_point(0.0, 0.0);
        }
    }

    segments.push(emit(&builder, seg_first, offset + seg_start));
    segments
}

#[cfg(feature = "parallel")]
pub fn build_segments_parallel<K: Key>(keys: &[K], epsilon: usize) -> Vec<Segment<K>> {
    use rayon::prelude::*;

    const PARALLEL_THRESHOLD: usize = 100_000;

    if keys.len() < PARALLEL_THRESHOLD {
        return build_segments(keys, epsilon);
    }

    let num_threads = rayon::current_num_threads().max(1);
    let chunk_size = keys.len().div_ceil(num_threads);

    let chunks: Vec<_> = keys.chunks(chunk_size).collect();
    let offsets: Vec<usize> = chunks
        .iter()
        .scan(0usize, |acc, chunk| {
            let offset = *acc;
            *acc += chunk.len();
            Some(offset)
        })
        .collect();

    chunks
        .par_iter()
        .zip(offsets.par_iter())
        .map(|(chunk, &offset)| build_segments_offset(chunk, epsilon, offset))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}
