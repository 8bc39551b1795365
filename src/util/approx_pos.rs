/// Approximate position returned by an index search.
///
/// The true rank of the queried key (its `lower_bound` position) is
/// guaranteed to lie in `[lo, hi)`, and `lo <= pos <= hi`. The window is
/// at most `2 * epsilon + 2` wide, so the caller finishes with a bounded
/// search independent of the data size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApproxPos {
    /// The predicted position of the key.
    pub pos: usize,
    /// The lowest index guaranteed to contain the key if it exists.
    pub lo: usize,
    /// One past the highest index guaranteed to contain the key if it exists.
    pub hi: usize,
}

impl ApproxPos {
    #[inline]
    pub fn new(pos: usize, lo: usize, hi: usize) -> Self {
        Self { pos, lo, hi }
    }
}
