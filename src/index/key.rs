use alloc::vec::Vec;
use core::cmp::Ordering;
use num_traits::AsPrimitive;

/// A key type the index can build linear models over.
///
/// Keys must be totally ordered and convertible to the `f64` position space
/// the segmenter works in. The little-endian codec hooks are what the
/// persisted format uses; every implementation encodes to a fixed width.
///
/// All primitive integers implement `Key`. Floating-point keys go through
/// [`F64Key`], which supplies the total order `f64` itself lacks.
pub trait Key: Copy + Ord + Default + Send + Sync + 'static + AsPrimitive<f64> {
    /// Width in bytes of the little-endian encoding.
    const ENCODED_LEN: usize;

    #[inline]
    fn to_f64_fast(self) -> f64 {
        self.as_()
    }

    /// Append the little-endian encoding of `self` to `out`.
    fn encode_le(self, out: &mut Vec<u8>);

    /// Decode a key from the first [`Self::ENCODED_LEN`] bytes of `src`.
    ///
    /// Callers must have validated that `src` is long enough.
    fn decode_le(src: &[u8]) -> Self;
}

macro_rules! impl_key_int {
    ($($t:ty),*) => {
        $(
            impl Key for $t {
                const ENCODED_LEN: usize = core::mem::size_of::<$t>();

                #[inline]
                fn encode_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn decode_le(src: &[u8]) -> Self {
                    let mut buf = [0u8; core::mem::size_of::<$t>()];
                    buf.copy_from_slice(&src[..core::mem::size_of::<$t>()]);
                    <$t>::from_le_bytes(buf)
                }
            }
        )*
    };
}

impl_key_int!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128);

// usize/isize encode through their 64-bit counterparts so the byte format
// stays identical across platforms.
impl Key for usize {
    const ENCODED_LEN: usize = 8;

    #[inline]
    fn encode_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self as u64).to_le_bytes());
    }

    #[inline]
    fn decode_le(src: &[u8]) -> Self {
        u64::decode_le(src) as usize
    }
}

impl Key for isize {
    const ENCODED_LEN: usize = 8;

    #[inline]
    fn encode_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self as i64).to_le_bytes());
    }

    #[inline]
    fn decode_le(src: &[u8]) -> Self {
        i64::decode_le(src) as isize
    }
}

/// An `f64` key with the total order required by the index.
///
/// Comparison uses `f64::total_cmp`, so `-0.0 < 0.0` and NaN sorts above
/// every finite value. Indexed data should stick to finite keys; the
/// linear models degrade to useless (but not unsound) predictions when
/// fed infinities.
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct F64Key(pub f64);

impl PartialEq for F64Key {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for F64Key {}

impl PartialOrd for F64Key {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for F64Key {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for F64Key {
    #[inline]
    fn from(v: f64) -> Self {
        Self(v)
    }
}

impl AsPrimitive<f64> for F64Key {
    #[inline]
    fn as_(self) -> f64 {
        self.0
    }
}

impl Key for F64Key {
    const ENCODED_LEN: usize = 8;

    #[inline]
    fn encode_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0.to_le_bytes());
    }

    #[inline]
    fn decode_le(src: &[u8]) -> Self {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&src[..8]);
        Self(f64::from_le_bytes(buf))
    }
}
