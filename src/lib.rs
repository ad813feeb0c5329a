//! pursuit_curriculum - reset-task generation for multi-drone pursuit.
//!
//! Drones chase a target around standing cylinders inside a circular arena.
//! Every episode starts from a [`Task`]: drone, target and cylinder
//! positions. The [`CurriculumController`] mixes uniformly drawn tasks with
//! perturbed copies of tasks the learner solves only part of the time, and
//! keeps the curated history diverse with farthest-point eviction.
//!
//! ```no_run
//! use pursuit_curriculum::{CurriculumController, GeneratorConfig};
//!
//! # fn main() -> Result<(), pursuit_curriculum::CurriculumError> {
//! let mut controller = CurriculumController::new(GeneratorConfig::default())?;
//! let batch = controller.reset(256)?.to_vec();
//! // run the episodes, then report one weight per lane
//! let success = vec![0.0; batch.len()];
//! controller.report_episode(&success)?;
//! println!("{}", controller.diagnostics());
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod config;
pub mod curriculum;
pub mod geometry;
pub mod grid;
pub mod nearby;
pub mod placement;
pub mod rng;
pub mod task;

pub use buffer::{BufferError, TaskBuffer};
pub use config::{ArenaConfig, ConfigError, CurriculumConfig, EvictionPolicy, GeneratorConfig, ObstacleCount};
pub use curriculum::{CurriculumController, CurriculumError, Diagnostics, EpisodeReport};
pub use geometry::Vec3;
pub use nearby::{NearbySampler, SamplingError};
pub use rng::{seeded_rng, TaskRng};
pub use task::{Task, TaskLayout};
