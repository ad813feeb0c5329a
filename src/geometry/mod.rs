//! Continuous geometry: positions and the line-of-sight predicates.

pub mod blocking;
pub mod types;

pub use blocking::{captured, line_blocked, lines_blocked, lines_blocked_batch, BLOCKING_EPS};
pub use types::Vec3;
