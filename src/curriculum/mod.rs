//! The curriculum loop: batch composition, the uniform-ratio ratchet and
//! periodic flush/curation of the history.

mod controller;
pub mod diagnostics;
pub mod error;

pub use controller::CurriculumController;
pub use diagnostics::{Diagnostics, EpisodeReport, ObstacleStats};
pub use error::CurriculumError;
