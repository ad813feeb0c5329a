//! Per-lane occupancy state.

use super::index::Cell;

/// Occupancy of a square grid for a single lane.
///
/// Cells outside the inscribed disk are marked occupied when the map is built
/// with [`GridMap::with_boundary_mask`] and are never cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridMap {
    resolution: usize,
    occupied: Vec<bool>,
}

impl GridMap {
    /// Creates a map with every cell free.
    pub fn new(resolution: usize) -> Self {
        Self {
            resolution,
            occupied: vec![false; resolution * resolution],
        }
    }

    /// Creates a map whose cells at or beyond `resolution / 2` from the centre
    /// cell are pre-occupied.
    pub fn with_boundary_mask(resolution: usize) -> Self {
        let mut map = Self::new(resolution);
        let radius = resolution / 2;
        for row in 0..resolution {
            for col in 0..resolution {
                let dr = row as f64 - radius as f64;
                let dc = col as f64 - radius as f64;
                if (dr * dr + dc * dc).sqrt() >= radius as f64 {
                    map.occupy(Cell::new(row, col));
                }
            }
        }
        map
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    fn offset(&self, cell: Cell) -> usize {
        cell.row * self.resolution + cell.col
    }

    /// # Panics
    ///
    /// Panics if `cell` lies outside the grid.
    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.occupied[self.offset(cell)]
    }

    /// Marks `cell` as taken. Returns false if it already was.
    pub fn occupy(&mut self, cell: Cell) -> bool {
        let offset = self.offset(cell);
        let was_free = !self.occupied[offset];
        self.occupied[offset] = true;
        was_free
    }

    /// Free cells in row-major order.
    pub fn free_cells(&self) -> Vec<Cell> {
        (0..self.resolution)
            .flat_map(|row| (0..self.resolution).map(move |col| Cell::new(row, col)))
            .filter(|&cell| !self.is_occupied(cell))
            .collect()
    }

    /// Returns true if every cell in `cells` is currently free and no two of
    /// them coincide, i.e. placing them all would occupy `cells.len()` new cells.
    pub fn admits(&self, cells: &[Cell]) -> bool {
        let mut scratch = self.clone();
        cells.iter().all(|&cell| scratch.occupy(cell))
    }
}
