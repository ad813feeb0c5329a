use thiserror::Error;

/// Errors raised while drawing cells from an occupancy grid.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("Not enough free cells in lane {lane}: {available} available, {required} required")]
    InsufficientFreeCells {
        lane: usize,
        available: usize,
        required: usize,
    },
}
