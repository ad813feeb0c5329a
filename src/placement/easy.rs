//! Easy seed tasks: drones start on the cells nearest to the target.

use std::collections::VecDeque;

use rand::Rng;

use super::error::PlacementError;
use super::rejection::RejectionPlacer;
use crate::config::ArenaConfig;
use crate::geometry::Vec3;
use crate::grid::{select_unoccupied_lane, Cell, GridIndex, GridMap};
use crate::task::Task;

const NEIGHBOURS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Builds tasks that a fresh learner can solve: a random target cell with
/// the drones packed on the closest free cells around it.
#[derive(Debug, Clone)]
pub struct EasyCaseGenerator {
    base_map: GridMap,
    placer: RejectionPlacer,
    num_agents: usize,
    z_range: (f64, f64),
    active_z: f64,
    parking_z: f64,
}

impl EasyCaseGenerator {
    pub fn new(arena: &ArenaConfig) -> Self {
        Self {
            base_map: GridMap::with_boundary_mask(arena.grid_resolution()),
            placer: RejectionPlacer::new(arena),
            num_agents: arena.num_agents,
            z_range: arena.spawn_z_range(),
            active_z: arena.active_cylinder_z(),
            parking_z: arena.parking_z,
        }
    }

    fn index(&self) -> &GridIndex {
        self.placer.index()
    }

    /// Breadth-first search over 4-neighbours for the `count` free cells
    /// nearest to `start`. Occupied cells are walked through but not taken.
    fn nearest_free_cells(&self, start: Cell, count: usize) -> Vec<Cell> {
        let n = self.base_map.resolution();
        let mut visited = vec![false; n * n];
        let mut queue = VecDeque::from([start]);
        visited[start.row * n + start.col] = true;
        let mut found = Vec::with_capacity(count);

        while let Some(cell) = queue.pop_front() {
            if found.len() >= count {
                break;
            }
            for (dr, dc) in NEIGHBOURS {
                let (Some(row), Some(col)) = (
                    cell.row.checked_add_signed(dr),
                    cell.col.checked_add_signed(dc),
                ) else {
                    continue;
                };
                if row >= n || col >= n || visited[row * n + col] {
                    continue;
                }
                visited[row * n + col] = true;
                let next = Cell::new(row, col);
                if !self.base_map.is_occupied(next) {
                    found.push(next);
                    if found.len() == count {
                        break;
                    }
                }
                queue.push_back(next);
            }
        }
        found
    }

    fn lift<R: Rng + ?Sized>(&self, cell: Cell, rng: &mut R) -> Vec3 {
        let (x, y) = self.index().to_continuous(cell);
        let (lo, hi) = self.z_range;
        Vec3::new(x, y, rng.gen_range(lo..=hi))
    }

    /// Generates one easy task.
    pub fn generate_lane<R: Rng + ?Sized>(
        &self,
        lane: usize,
        rng: &mut R,
    ) -> Result<Task, PlacementError> {
        let target_cell = select_unoccupied_lane(&self.base_map, lane, 1, rng)?[0];
        let drone_cells = self.nearest_free_cells(target_cell, self.num_agents);
        if drone_cells.len() < self.num_agents {
            return Err(PlacementError::NoRoomForAgents {
                lane,
                found: drone_cells.len(),
                required: self.num_agents,
            });
        }

        let drones: Vec<Vec3> = drone_cells.into_iter().map(|c| self.lift(c, rng)).collect();
        let target = self.lift(target_cell, rng);
        let placement = self.placer.place_lane(lane, &drones, &target, rng)?;
        let cylinders = placement.cylinders(self.active_z, self.parking_z);
        Ok(Task::from_parts(&drones, target, &cylinders))
    }

    /// Generates `n` easy tasks.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        n: usize,
        rng: &mut R,
    ) -> Result<Vec<Task>, PlacementError> {
        (0..n).map(|lane| self.generate_lane(lane, rng)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObstacleCount;
    use crate::rng::seeded_rng;

    #[test]
    fn drones_surround_target() {
        let arena = ArenaConfig::default();
        let generator = EasyCaseGenerator::new(&arena);
        let index = GridIndex::from_arena(&arena);
        let base = GridMap::with_boundary_mask(index.resolution());
        let mut rng = seeded_rng(30);
        for task in generator.generate(50, &mut rng).unwrap() {
            let target_cell = index.cell_of(&task.target());
            let mut cells: Vec<Cell> = task.drones().iter().map(|d| index.cell_of(d)).collect();
            for c in &cells {
                let manhattan = c.row.abs_diff(target_cell.row) + c.col.abs_diff(target_cell.col);
                assert!(manhattan <= 3, "drone {c} far from target {target_cell}");
            }
            cells.push(target_cell);
            assert!(base.admits(&cells));
        }
    }

    #[test]
    fn heights_within_spawn_band() {
        let arena = ArenaConfig::default();
        let generator = EasyCaseGenerator::new(&arena);
        let (lo, hi) = arena.spawn_z_range();
        let mut rng = seeded_rng(31);
        for task in generator.generate(20, &mut rng).unwrap() {
            for p in task.drones().into_iter().chain([task.target()]) {
                assert!(p.z >= lo && p.z <= hi);
            }
        }
    }

    #[test]
    fn zero_jitter_pins_heights_to_mid_band() {
        let arena = ArenaConfig {
            spawn_z_jitter: 0.0,
            ..ArenaConfig::default()
        };
        let generator = EasyCaseGenerator::new(&arena);
        let mid = arena.max_height / 2.0;
        let mut rng = seeded_rng(33);
        for task in generator.generate(10, &mut rng).unwrap() {
            for p in task.drones().into_iter().chain([task.target()]) {
                assert_eq!(p.z, mid);
            }
        }
    }

    #[test]
    fn bfs_takes_immediate_neighbours_first() {
        let arena = ArenaConfig::default();
        let generator = EasyCaseGenerator::new(&arena);
        let mut cells = generator.nearest_free_cells(Cell::new(4, 4), 4);
        cells.sort();
        assert_eq!(
            cells,
            vec![
                Cell::new(3, 4),
                Cell::new(4, 3),
                Cell::new(4, 5),
                Cell::new(5, 4)
            ]
        );
    }

    #[test]
    fn too_many_agents_reported() {
        let arena = ArenaConfig {
            num_agents: 50,
            num_cylinders: 0,
            obstacle_count: ObstacleCount::Fixed(0),
            ..ArenaConfig::default()
        };
        let generator = EasyCaseGenerator::new(&arena);
        let mut rng = seeded_rng(32);
        assert_eq!(
            generator.generate_lane(0, &mut rng),
            Err(PlacementError::NoRoomForAgents {
                lane: 0,
                found: 44,
                required: 50
            })
        );
    }
}
