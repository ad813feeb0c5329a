//! Discrete occupancy grid over the circular arena.
//!
//! [`GridIndex`] maps continuous xy to cells and back, [`GridMap`] tracks
//! which cells are taken for one lane, and [`select_unoccupied`] draws free
//! cells without replacement.

pub mod error;
pub mod index;
pub mod map;
pub mod sampler;

pub use error::GridError;
pub use index::{Cell, GridIndex};
pub use map::GridMap;
pub use sampler::{select_unoccupied, select_unoccupied_lane};
