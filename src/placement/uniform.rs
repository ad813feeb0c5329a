//! Fresh tasks drawn uniformly from the spawn regions.

use rand::Rng;

use super::error::PlacementError;
use super::region::SpawnRegion;
use super::rejection::RejectionPlacer;
use crate::config::ArenaConfig;
use crate::geometry::Vec3;
use crate::grid::{Cell, GridIndex, GridMap};
use crate::task::Task;

/// Draws drones and target uniformly, redrawing until their cells are
/// pairwise distinct and clear of the masked rim, then places the cylinders
/// with a [`RejectionPlacer`].
#[derive(Debug, Clone)]
pub struct UniformTaskSampler {
    placer: RejectionPlacer,
    base_map: GridMap,
    drone_region: SpawnRegion,
    target_region: SpawnRegion,
    num_agents: usize,
    max_attempts: usize,
    active_z: f64,
    parking_z: f64,
}

impl UniformTaskSampler {
    pub fn new(arena: &ArenaConfig, max_attempts: usize) -> Self {
        Self {
            placer: RejectionPlacer::new(arena),
            base_map: GridMap::with_boundary_mask(arena.grid_resolution()),
            drone_region: SpawnRegion::drones(arena),
            target_region: SpawnRegion::target(arena),
            num_agents: arena.num_agents,
            max_attempts,
            active_z: arena.active_cylinder_z(),
            parking_z: arena.parking_z,
        }
    }

    fn index(&self) -> &GridIndex {
        self.placer.index()
    }

    fn draw_agents<R: Rng + ?Sized>(&self, rng: &mut R) -> (Vec<Vec3>, Vec3) {
        let drones = (0..self.num_agents)
            .map(|_| self.drone_region.sample(rng))
            .collect();
        (drones, self.target_region.sample(rng))
    }

    fn cells_admitted(&self, drones: &[Vec3], target: &Vec3) -> bool {
        let cells: Vec<Cell> = drones
            .iter()
            .chain(std::iter::once(target))
            .map(|p| self.index().cell_of(p))
            .collect();
        self.base_map.admits(&cells)
    }

    /// Generates the task for one lane.
    pub fn sample_lane<R: Rng + ?Sized>(
        &self,
        lane: usize,
        rng: &mut R,
    ) -> Result<Task, PlacementError> {
        let (drones, target) = (0..self.max_attempts)
            .map(|_| self.draw_agents(rng))
            .find(|(d, t)| self.cells_admitted(d, t))
            .ok_or(PlacementError::AttemptsExhausted {
                lane,
                attempts: self.max_attempts,
            })?;

        let placement = self.placer.place_lane(lane, &drones, &target, rng)?;
        let cylinders = placement.cylinders(self.active_z, self.parking_z);
        Ok(Task::from_parts(&drones, target, &cylinders))
    }

    /// Generates `n` tasks.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<Task>, PlacementError> {
        (0..n).map(|lane| self.sample_lane(lane, rng)).collect()
    }
}
