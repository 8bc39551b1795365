//! Learned index implementations.
//!
//! The pieces, bottom up:
//!
//! - [`model`]: the streaming segmenter turning sorted keys into linear
//!   models with bounded prediction error
//! - [`Segment`]: one such model
//! - [`Static`]: the multi-level recursive index over an external sorted
//!   slice, built by segmenting the data and then the segments themselves
//! - [`Dynamic`]: a mutable key-value index layering a merge cascade over
//!   static indexes (requires the `std` feature)
//! - [`format`]: the little-endian persisted form of a static index

pub(crate) mod builder;
#[cfg(feature = "std")]
pub mod dynamic;
pub mod format;
pub mod key;
pub mod model;
pub mod segment;
mod r#static;

pub use builder::Builder;
#[cfg(feature = "std")]
pub use dynamic::Dynamic;
pub use key::{F64Key, Key};
pub use r#static::Static;
pub use segment::Segment;
