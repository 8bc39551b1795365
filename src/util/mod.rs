pub mod approx_pos;
pub mod range;
pub mod search;

pub use approx_pos::ApproxPos;
