//! Dynamic learned index based on the Logarithmic Method.
//!
//! Records live in a cascade of levels of geometrically increasing
//! capacity. Mutations land in the smallest level with room, merging
//! everything below it in one pass; deletions are tombstones that shadow
//! older records until a merge reaches the highest occupied level. Levels
//! past a configurable threshold carry their own [`Static`] index, so
//! point lookups in large levels cost a bounded window search instead of
//! a full binary search.

use alloc::vec::Vec;
use core::iter::Peekable;
use core::ops::{Bound, RangeBounds};

use crate::error::Error;
use crate::index::Key;
use crate::index::Static;

const DEFAULT_BASE_CAPACITY: usize = 8;
const DEFAULT_MIN_INDEXED_LEVEL: usize = 7;

/// One versioned entry: a tombstone is a record whose value is `None`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        bound = "K: serde::Serialize + serde::de::DeserializeOwned, V: serde::Serialize + serde::de::DeserializeOwned"
    )
)]
struct Record<K, V> {
    key: K,
    value: Option<V>,
}

impl<K, V> Record<K, V> {
    #[inline]
    fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        bound = "K: serde::Serialize + serde::de::DeserializeOwned, V: serde::Serialize + serde::de::DeserializeOwned"
    )
)]
struct Level<K: Key, V> {
    records: Vec<Record<K, V>>,
    index: Option<Static<K>>,
}

impl<K: Key, V> Level<K, V> {
    const fn empty() -> Self {
        Self {
            records: Vec::new(),
            index: None,
        }
    }

    /// Locate `key` in this level, through the attached index if present.
    fn find(&self, key: &K) -> Option<&Record<K, V>> {
        if self.records.is_empty() {
            return None;
        }

        let pos = match &self.index {
            Some(index) => {
                let approx = index.search(key);
                let hi = approx.hi.min(self.records.len());
                let window = &self.records[approx.lo..hi];
                match window.binary_search_by(|r| r.key.cmp(key)) {
                    Ok(i) => approx.lo + i,
                    Err(_) => return None,
                }
            }
            None => match self.records.binary_search_by(|r| r.key.cmp(key)) {
                Ok(i) => i,
                Err(_) => return None,
            },
        };

        Some(&self.records[pos])
    }

    fn lower_bound_pos(&self, key: &K) -> usize {
        self.records.partition_point(|r| r.key < *key)
    }

    fn upper_bound_pos(&self, key: &K) -> usize {
        self.records.partition_point(|r| r.key <= *key)
    }
}

/// A mutable learned index with sorted-map semantics.
///
/// Keys map to the most recently assigned value; erased keys behave as
/// absent until re-inserted. Iteration is in ascending key order. The
/// structure is not internally synchronized: concurrent use requires
/// external mutual exclusion.
///
/// # Example
///
/// ```
/// use rankline::Dynamic;
///
/// let mut index: Dynamic<u64, &str> = Dynamic::new(64, 4);
///
/// index.insert_or_assign(3, "three");
/// index.insert_or_assign(1, "one");
/// index.insert_or_assign(3, "THREE");
/// index.erase(&1);
///
/// assert_eq!(index.get(&3), Some(&"THREE"));
/// assert_eq!(index.get(&1), None);
/// assert_eq!(index.len(), 1);
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        bound = "K: serde::Serialize + serde::de::DeserializeOwned, V: serde::Serialize + serde::de::DeserializeOwned"
    )
)]
pub struct Dynamic<K: Key, V> {
    levels: Vec<Level<K, V>>,
    len: usize,
    epsilon: usize,
    epsilon_recursive: usize,
    base_capacity: usize,
    min_indexed_level: usize,
}

impl<K: Key, V> Dynamic<K, V> {
    /// Create a new empty dynamic index.
    pub fn new(epsilon: usize, epsilon_recursive: usize) -> Self {
        Self {
            levels: Vec::new(),
            len: 0,
            epsilon: epsilon.max(1),
            epsilon_recursive,
            base_capacity: DEFAULT_BASE_CAPACITY,
            min_indexed_level: DEFAULT_MIN_INDEXED_LEVEL,
        }
    }

    /// Set the capacity of level 0; rounded up to a power of two.
    ///
    /// Only meaningful on an empty index.
    pub fn with_base_capacity(mut self, capacity: usize) -> Self {
        debug_assert!(self.levels.is_empty(), "cannot resize a populated cascade");
        self.base_capacity = capacity.next_power_of_two().max(2);
        self
    }

    /// Set the first level that carries an attached static index.
    ///
    /// Only meaningful on an empty index.
    pub fn with_min_indexed_level(mut self, level: usize) -> Self {
        debug_assert!(self.levels.is_empty(), "cannot resize a populated cascade");
        self.min_indexed_level = level;
        self
    }

    /// Build a dynamic index from entries pre-sorted by key.
    ///
    /// When the same key appears more than once the last entry wins. The
    /// whole input lands in the smallest level that fits it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsortedKeys`] if the entries are out of order.
    pub fn from_sorted(
        entries: Vec<(K, V)>,
        epsilon: usize,
        epsilon_recursive: usize,
    ) -> Result<Self, Error> {
        let mut this = Self::new(epsilon, epsilon_recursive);
        this.load_sorted(entries)?;
        Ok(this)
    }

    /// Bulk-load pre-sorted entries into an empty index.
    ///
    /// Same semantics as [`Dynamic::from_sorted`], but usable after the
    /// cascade has been configured with the `with_*` methods.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsortedKeys`] if the entries are out of order.
    pub fn load_sorted(&mut self, entries: Vec<(K, V)>) -> Result<(), Error> {
        debug_assert!(
            self.levels.iter().all(|l| l.records.is_empty()),
            "bulk load requires an empty cascade"
        );
        if entries.windows(2).any(|w| w[0].0 > w[1].0) {
            return Err(Error::UnsortedKeys);
        }
        self.bulk_load(entries);
        Ok(())
    }

    fn bulk_load(&mut self, entries: Vec<(K, V)>) {
        let mut records: Vec<Record<K, V>> = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match records.last_mut() {
                Some(last) if last.key == key => last.value = Some(value),
                _ => records.push(Record {
                    key,
                    value: Some(value),
                }),
            }
        }

        if records.is_empty() {
            return;
        }

        let mut target = 0;
        while self.capacity(target) < records.len() {
            target += 1;
        }
        while self.levels.len() <= target {
            self.levels.push(Level::empty());
        }

        self.len = records.len();
        self.set_level(target, records);
    }

    #[inline]
    fn capacity(&self, level: usize) -> usize {
        self.base_capacity
            .checked_shl(level as u32)
            .unwrap_or(usize::MAX)
    }

    /// Insert `key` with `value`, replacing any current value.
    pub fn insert_or_assign(&mut self, key: K, value: V) {
        if self.get(&key).is_none() {
            self.len += 1;
        }
        self.push_record(Record {
            key,
            value: Some(value),
        });
    }

    /// Remove `key`. Returns whether it was present.
    ///
    /// The removal is recorded as a tombstone that shadows every older
    /// record of the key; the tombstone itself is discarded once a merge
    /// carries it into the highest occupied level.
    pub fn erase(&mut self, key: &K) -> bool {
        let was_present = self.get(key).is_some();
        if was_present {
            self.len -= 1;
        } else if self.levels.iter().all(|l| l.records.is_empty()) {
            // Nothing a tombstone could shadow.
            return false;
        }
        self.push_record(Record {
            key: *key,
            value: None,
        });
        was_present
    }

    fn push_record(&mut self, rec: Record<K, V>) {
        // Smallest level whose capacity fits everything below it plus the
        // new record.
        let mut target = 0;
        let mut pending = 1usize;
        loop {
            if target == self.levels.len() {
                self.levels.push(Level::empty());
            }
            pending += self.levels[target].records.len();
            if pending <= self.capacity(target) {
                break;
            }
            target += 1;
        }

        let drop_tombstones = self.levels[target + 1..]
            .iter()
            .all(|l| l.records.is_empty());

        // Sources ordered newest to oldest: the incoming record, then the
        // levels from the top of the cascade down to the target.
        let mut sources: Vec<Vec<Record<K, V>>> = Vec::with_capacity(target + 2);
        sources.push(alloc::vec![rec]);
        for level in &mut self.levels[..=target] {
            sources.push(core::mem::take(&mut level.records));
            level.index = None;
        }

        let merged = merge_records(sources, pending, drop_tombstones);
        self.set_level(target, merged);
    }

    fn set_level(&mut self, target: usize, records: Vec<Record<K, V>>) {
        let index = if target >= self.min_indexed_level && !records.is_empty() {
            let keys: Vec<K> = records.iter().map(|r| r.key).collect();
            match Static::new(&keys, self.epsilon, self.epsilon_recursive) {
                Ok(index) => Some(index),
                Err(_) => None,
            }
        } else {
            None
        };

        self.levels[target] = Level { records, index };
    }

    /// The current value of `key`, if present.
    pub fn get(&self, key: &K) -> Option<&V> {
        for level in &self.levels {
            if let Some(rec) = level.find(key) {
                // A tombstone here shadows everything older.
                return rec.value.as_ref();
            }
        }
        None
    }

    /// Number of live records holding `key`: 0 or 1.
    #[inline]
    pub fn count(&self, key: &K) -> usize {
        self.get(key).is_some() as usize
    }

    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// The first entry with a key `>= key`.
    pub fn lower_bound(&self, key: &K) -> Option<(&K, &V)> {
        self.range(*key..).next()
    }

    /// The first entry with a key `> key`.
    pub fn upper_bound(&self, key: &K) -> Option<(&K, &V)> {
        self.range((Bound::Excluded(*key), Bound::Unbounded)).next()
    }

    /// Number of live keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Record counts per level, tombstones included; empty levels show 0.
    pub fn level_sizes(&self) -> Vec<usize> {
        self.levels.iter().map(|l| l.records.len()).collect()
    }

    /// Approximate memory usage in bytes.
    pub fn size_in_bytes(&self) -> usize {
        let records: usize = self
            .levels
            .iter()
            .map(|l| l.records.capacity() * core::mem::size_of::<Record<K, V>>())
            .sum();
        let indexes: usize = self
            .levels
            .iter()
            .filter_map(|l| l.index.as_ref().map(Static::size_in_bytes))
            .sum();
        core::mem::size_of::<Self>() + records + indexes
    }

    /// Iterate over live entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.make_iter(Bound::Unbounded, Bound::Unbounded)
    }

    /// Iterate over live entries whose keys fall in `range`.
    pub fn range<R>(&self, range: R) -> Iter<'_, K, V>
    where
        R: RangeBounds<K>,
    {
        self.make_iter(range.start_bound().cloned(), range.end_bound().cloned())
    }

    fn make_iter(&self, start: Bound<K>, end: Bound<K>) -> Iter<'_, K, V> {
        let cursors = self
            .levels
            .iter()
            .filter(|l| !l.records.is_empty())
            .map(|l| {
                let from = match &start {
                    Bound::Included(k) => l.lower_bound_pos(k),
                    Bound::Excluded(k) => l.upper_bound_pos(k),
                    Bound::Unbounded => 0,
                };
                &l.records[from..]
            })
            .collect();
        Iter { cursors, end }
    }
}

impl<K: Key, V> Default for Dynamic<K, V> {
    fn default() -> Self {
        Self::new(64, 4)
    }
}

impl<K: Key, V> FromIterator<(K, V)> for Dynamic<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut entries: Vec<(K, V)> = iter.into_iter().collect();
        // Stable sort keeps insertion order within a key, so the last
        // entry of a run is the newest.
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut this = Self::default();
        this.bulk_load(entries);
        this
    }
}

impl<K: Key, V> Extend<(K, V)> for Dynamic<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert_or_assign(key, value);
        }
    }
}

/// Merge sources ordered newest to oldest into one sorted run; on key
/// collisions the newest record wins.
fn merge_records<K: Key, V>(
    sources: Vec<Vec<Record<K, V>>>,
    size_hint: usize,
    drop_tombstones: bool,
) -> Vec<Record<K, V>> {
    let mut out = Vec::with_capacity(size_hint);
    let mut iters: Vec<Peekable<alloc::vec::IntoIter<Record<K, V>>>> =
        sources.into_iter().map(|s| s.into_iter().peekable()).collect();

    loop {
        let mut min_key: Option<K> = None;
        for it in iters.iter_mut() {
            if let Some(r) = it.peek() {
                min_key = Some(match min_key {
                    Some(m) if m <= r.key => m,
                    _ => r.key,
                });
            }
        }
        let Some(key) = min_key else { break };

        let mut newest: Option<Record<K, V>> = None;
        for it in iters.iter_mut() {
            if it.peek().is_some_and(|r| r.key == key) {
                let rec = it.next();
                if newest.is_none() {
                    newest = rec;
                }
            }
        }

        if let Some(rec) = newest {
            if !(drop_tombstones && rec.is_tombstone()) {
                out.push(rec);
            }
        }
    }

    out
}

/// Merging cursor over the level cascade: yields each live key once, with
/// its newest value, skipping tombstones and shadowed records in a single
/// pass.
pub struct Iter<'a, K: Key, V> {
    /// Remaining records per non-empty level, newest level first.
    cursors: Vec<&'a [Record<K, V>]>,
    end: Bound<K>,
}

impl<'a, K: Key, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut min_key: Option<K> = None;
            for cursor in self.cursors.iter() {
                if let Some(r) = cursor.first() {
                    min_key = Some(match min_key {
                        Some(m) if m <= r.key => m,
                        _ => r.key,
                    });
                }
            }
            let key = min_key?;

            match &self.end {
                Bound::Included(e) if key > *e => return None,
                Bound::Excluded(e) if key >= *e => return None,
                _ => {}
            }

            let mut newest: Option<&'a Record<K, V>> = None;
            for cursor in self.cursors.iter_mut() {
                let slice: &'a [Record<K, V>] = *cursor;
                if let Some(r) = slice.first() {
                    if r.key == key {
                        if newest.is_none() {
                            newest = Some(r);
                        }
                        *cursor = &slice[1..];
                    }
                }
            }

            // Cursors are ordered newest to oldest, so the first hit wins;
            // a tombstone means the key is absent.
            if let Some(rec) = newest {
                if let Some(value) = rec.value.as_ref() {
                    return Some((&rec.key, value));
                }
            }
        }
    }
}

impl<'a, K: Key, V> IntoIterator for &'a Dynamic<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
