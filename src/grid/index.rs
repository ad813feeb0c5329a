//! Conversion between continuous arena coordinates and grid cells.

use std::fmt;

use crate::config::ArenaConfig;
use crate::geometry::Vec3;

/// A grid cell. `row` indexes the x axis, `col` the y axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.row, self.col)
    }
}

/// Maps positions to cells of a `resolution × resolution` grid centred on the origin.
///
/// Both directions saturate instead of failing: cells are clamped to
/// `0..resolution` and continuous coordinates to `[-boundary, boundary]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridIndex {
    resolution: usize,
    cell_size: f64,
    boundary: f64,
    center_pos: (f64, f64),
    center_grid: i64,
}

impl GridIndex {
    /// Creates an index with the grid centre at the arena origin.
    pub fn new(resolution: usize, cell_size: f64, boundary: f64) -> Self {
        Self {
            resolution,
            cell_size,
            boundary,
            center_pos: (0.0, 0.0),
            center_grid: (resolution / 2) as i64,
        }
    }

    /// Builds the index for an arena: one cylinder diameter per cell.
    pub fn from_arena(arena: &ArenaConfig) -> Self {
        Self::new(
            arena.grid_resolution(),
            arena.cell_size(),
            arena.placement_boundary(),
        )
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn boundary(&self) -> f64 {
        self.boundary
    }

    fn axis_to_grid(&self, value: f64, center: f64) -> usize {
        // ties go to even, matching the rounding used when the history was recorded
        let offset = ((value - center) / self.cell_size).round_ties_even() as i64;
        let max = self.resolution.saturating_sub(1) as i64;
        (offset + self.center_grid).clamp(0, max) as usize
    }

    fn axis_to_continuous(&self, index: usize, center: f64) -> f64 {
        let offset = (index as i64 - self.center_grid) as f64 * self.cell_size;
        (center + offset).clamp(-self.boundary, self.boundary)
    }

    /// Cell containing `(x, y)`.
    pub fn to_cell(&self, x: f64, y: f64) -> Cell {
        Cell::new(
            self.axis_to_grid(x, self.center_pos.0),
            self.axis_to_grid(y, self.center_pos.1),
        )
    }

    /// Cell containing the ground projection of `p`.
    pub fn cell_of(&self, p: &Vec3) -> Cell {
        self.to_cell(p.x, p.y)
    }

    /// Centre of `cell` in continuous coordinates.
    pub fn to_continuous(&self, cell: Cell) -> (f64, f64) {
        (
            self.axis_to_continuous(cell.row, self.center_pos.0),
            self.axis_to_continuous(cell.col, self.center_pos.1),
        )
    }
}
