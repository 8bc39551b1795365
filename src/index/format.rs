//! Little-endian persisted form of a static index and its keys.
//!
//! Layout, in order:
//!
//! ```text
//! u64 n
//! u64 epsilon
//! u64 epsilon_recursive
//! u64 level_count
//! for each level, data level first:
//!     u64 segment_count
//!     segment_count x { K first_key; f64 slope; i64 intercept }
//! n x K sorted keys
//! ```
//!
//! The decoder validates lengths and key order, so corrupted or truncated
//! input surfaces as an [`Error`] instead of a bogus index.

use alloc::vec::Vec;

use crate::error::Error;
use crate::index::Key;
use crate::index::Segment;
use crate::index::Static;

/// Serialize `index` and the keys it was built over.
pub fn encode<K: Key>(index: &Static<K>, keys: &[K]) -> Vec<u8> {
    debug_assert_eq!(index.len(), keys.len(), "index was built over other keys");

    let seg_len = K::ENCODED_LEN + 16;
    let mut out = Vec::with_capacity(
        32 + index.segments_count() * (seg_len + 8) + keys.len() * K::ENCODED_LEN,
    );

    out.extend_from_slice(&(keys.len() as u64).to_le_bytes());
    out.extend_from_slice(&(index.epsilon() as u64).to_le_bytes());
    out.extend_from_slice(&(index.epsilon_recursive() as u64).to_le_bytes());

    let height = index.height();
    out.extend_from_slice(&(height as u64).to_le_bytes());

    // Layout level 0 is the root; the format stores the data level first.
    for level in (0..height).rev() {
        let segments = index.level_segments(level);
        out.extend_from_slice(&(segments.len() as u64).to_le_bytes());
        for seg in segments {
            seg.key.encode_le(&mut out);
            out.extend_from_slice(&seg.slope.to_le_bytes());
            out.extend_from_slice(&seg.intercept.to_le_bytes());
        }
    }

    for &key in keys {
        key.encode_le(&mut out);
    }

    out
}

/// Deserialize an index and its keys from [`encode`] output.
pub fn decode<K: Key>(bytes: &[u8]) -> Result<(Static<K>, Vec<K>), Error> {
    let mut reader = Reader::new(bytes);

    let n = reader.read_u64()? as usize;
    let epsilon = reader.read_u64()? as usize;
    let epsilon_recursive = reader.read_u64()? as usize;
    let level_count = reader.read_u64()? as usize;

    if n == 0 {
        return Err(Error::InvalidFormat("zero element count"));
    }
    if epsilon == 0 {
        return Err(Error::InvalidFormat("zero epsilon"));
    }
    if level_count == 0 {
        return Err(Error::InvalidFormat("zero level count"));
    }

    let seg_len = K::ENCODED_LEN + 16;
    let mut levels: Vec<Vec<Segment<K>>> = Vec::with_capacity(level_count);
    for _ in 0..level_count {
        let count = reader.read_u64()? as usize;
        if count == 0 {
            return Err(Error::InvalidFormat("empty level"));
        }
        reader.ensure(count.checked_mul(seg_len).ok_or(Error::TruncatedInput)?)?;

        let mut segments = Vec::with_capacity(count);
        for _ in 0..count {
            let key = reader.read_key::<K>()?;
            let slope = f64::from_le_bytes(reader.read_array::<8>()?);
            let intercept = i64::from_le_bytes(reader.read_array::<8>()?);
            segments.push(Segment::new(key, slope, intercept));
        }
        levels.push(segments);
    }

    reader.ensure(n.checked_mul(K::ENCODED_LEN).ok_or(Error::TruncatedInput)?)?;
    let mut keys = Vec::with_capacity(n);
    for _ in 0..n {
        keys.push(reader.read_key::<K>()?);
    }
    if !reader.is_exhausted() {
        return Err(Error::InvalidFormat("trailing bytes"));
    }
    if keys.windows(2).any(|w| w[0] > w[1]) {
        return Err(Error::UnsortedKeys);
    }

    // Rebuild the root-first layout the index uses internally.
    let total: usize = levels.iter().map(Vec::len).sum();
    let mut segments = Vec::with_capacity(total);
    let mut levels_offsets = Vec::with_capacity(level_count + 1);
    levels_offsets.push(0);
    for level in levels.iter().rev() {
        segments.extend_from_slice(level);
        levels_offsets.push(segments.len());
    }

    let first_key = keys[0];
    let last_key = keys[n - 1];
    let index = Static::from_parts(
        epsilon,
        epsilon_recursive,
        n,
        first_key,
        last_key,
        levels_offsets,
        segments,
    );

    Ok((index, keys))
}

struct Reader<'a> {
    bytes: &'a [u8],
    off: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, off: 0 }
    }

    fn ensure(&self, len: usize) -> Result<(), Error> {
        if self.bytes.len() - self.off < len {
            return Err(Error::TruncatedInput);
        }
        Ok(())
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], Error> {
        self.ensure(len)?;
        let out = &self.bytes[self.off..self.off + len];
        self.off += len;
        Ok(out)
    }

    fn read_u64(&mut self) -> Result<u64, Error> {
        Ok(u64::from_le_bytes(self.read_array::<8>()?))
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    fn read_key<K: Key>(&mut self) -> Result<K, Error> {
        Ok(K::decode_le(self.take(K::ENCODED_LEN)?))
    }

    fn is_exhausted(&self) -> bool {
        self.off == self.bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn test_roundtrip_basic() {
        let keys: Vec<u64> = (0..10_000).map(|i| i * 3).collect();
        let index = Static::new(&keys, 32, 4).unwrap();

        let bytes = encode(&index, &keys);
        let (decoded, decoded_keys) = decode::<u64>(&bytes).unwrap();

        assert_eq!(decoded_keys, keys);
        assert_eq!(decoded.len(), index.len());
        assert_eq!(decoded.height(), index.height());
        assert_eq!(decoded.segments_count(), index.segments_count());

        for probe in [0u64, 1, 1500, 29_997, 29_998, 50_000] {
            assert_eq!(
                decoded.lower_bound(&decoded_keys, &probe),
                index.lower_bound(&keys, &probe),
                "mismatch for probe {}",
                probe
            );
        }
    }

    #[test]
    fn test_roundtrip_signed() {
        let keys: Vec<i64> = (-1000..1000).collect();
        let index = Static::new(&keys, 16, 4).unwrap();

        let bytes = encode(&index, &keys);
        let (decoded, decoded_keys) = decode::<i64>(&bytes).unwrap();

        for probe in [-1000i64, -1, 0, 999, 1000] {
            assert_eq!(
                decoded.lower_bound(&decoded_keys, &probe),
                index.lower_bound(&keys, &probe)
            );
        }
    }

    #[test]
    fn test_roundtrip_single_key() {
        let keys: Vec<u64> = alloc::vec![42];
        let index = Static::new(&keys, 64, 4).unwrap();

        let bytes = encode(&index, &keys);
        let (decoded, decoded_keys) = decode::<u64>(&bytes).unwrap();
        assert_eq!(decoded_keys, keys);
        assert_eq!(decoded.lower_bound(&decoded_keys, &42), 0);
    }

    #[test]
    fn test_truncated_input() {
        let keys: Vec<u64> = (0..100).collect();
        let index = Static::new(&keys, 8, 4).unwrap();
        let bytes = encode(&index, &keys);

        for cut in [0, 7, 31, bytes.len() / 2, bytes.len() - 1] {
            let err = decode::<u64>(&bytes[..cut]).unwrap_err();
            assert!(
                matches!(err, Error::TruncatedInput | Error::InvalidFormat(_)),
                "cut at {} gave {:?}",
                cut,
                err
            );
        }
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let keys: Vec<u64> = (0..100).collect();
        let index = Static::new(&keys, 8, 4).unwrap();
        let mut bytes = encode(&index, &keys);
        bytes.push(0);

        assert_eq!(
            decode::<u64>(&bytes).unwrap_err(),
            Error::InvalidFormat("trailing bytes")
        );
    }

    #[test]
    fn test_zero_counts_rejected() {
        let zeros = [0u8; 32];
        assert!(decode::<u64>(&zeros).is_err());
    }

    #[test]
    fn test_unsorted_keys_rejected() {
        let keys: Vec<u64> = (0..100).collect();
        let index = Static::new(&keys, 8, 4).unwrap();
        let mut bytes = encode(&index, &keys);

        // Swap the low bytes of the last two keys in place.
        let tail = bytes.len();
        bytes.swap(tail - 8, tail - 16);

        assert!(decode::<u64>(&bytes).is_err());
    }
}
