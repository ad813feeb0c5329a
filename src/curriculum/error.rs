use thiserror::Error;

use crate::buffer::BufferError;
use crate::config::ConfigError;
use crate::nearby::SamplingError;
use crate::placement::PlacementError;

/// Errors raised by the curriculum controller.
#[derive(Debug, Error)]
pub enum CurriculumError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error(transparent)]
    Sampling(#[from] SamplingError),

    #[error("Batch size changed from {expected} to {actual} while the batch is being reused")]
    BatchSizeChanged { expected: usize, actual: usize },

    #[error("Got {actual} success weights for a batch of {expected} tasks")]
    SuccessLengthMismatch { expected: usize, actual: usize },

    #[error("Episode reported without an active batch; call reset first")]
    NoActiveBatch,
}
