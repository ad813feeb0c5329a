//! Collision-free generation of fresh tasks.
//!
//! - [`RejectionPlacer`] puts cylinders on free grid cells around fixed drones and target.
//! - [`UniformTaskSampler`] draws drones and target in their spawn regions, then places cylinders.
//! - [`EasyCaseGenerator`] clusters the drones next to the target to seed the history.

pub mod easy;
pub mod error;
pub mod region;
pub mod rejection;
pub mod uniform;

pub use easy::EasyCaseGenerator;
pub use error::PlacementError;
pub use region::SpawnRegion;
pub use rejection::{ObstaclePlacement, RejectionPlacer};
pub use uniform::UniformTaskSampler;
