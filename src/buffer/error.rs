use std::path::PathBuf;

use thiserror::Error;

use crate::task::TaskDimError;

/// Errors raised by the task buffer.
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("Cannot sample from an empty history buffer")]
    EmptyHistory,

    #[error("Weight vector has length {actual}, expected {expected} (one per collected task)")]
    WeightLengthMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Dim(#[from] TaskDimError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid history file {path}: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },
}
