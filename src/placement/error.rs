use thiserror::Error;

use crate::grid::GridError;

/// Errors raised while generating fresh tasks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlacementError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("Lane {lane}: no collision-free drone/target draw after {attempts} attempts")]
    AttemptsExhausted { lane: usize, attempts: usize },

    #[error("Lane {lane}: found {found} free cells near the target, {required} drones need placing")]
    NoRoomForAgents {
        lane: usize,
        found: usize,
        required: usize,
    },
}
