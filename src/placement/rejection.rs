//! Obstacle placement on free grid cells.

use rand::Rng;

use crate::config::{ArenaConfig, ObstacleCount};
use crate::geometry::Vec3;
use crate::grid::{select_unoccupied_lane, GridError, GridIndex, GridMap};

/// Cylinder positions for one lane.
///
/// Every slot gets its own grid cell, parked ones included; `inactive[j]`
/// tells which slots are sunk to the parking depth when the task is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ObstaclePlacement {
    pub xy: Vec<(f64, f64)>,
    pub inactive: Vec<bool>,
}

impl ObstaclePlacement {
    /// Number of slots that stay in play.
    pub fn num_active(&self) -> usize {
        self.inactive.iter().filter(|&&i| !i).count()
    }

    /// Full cylinder positions: active ones at `active_z`, the rest at `parking_z`.
    pub fn cylinders(&self, active_z: f64, parking_z: f64) -> Vec<Vec3> {
        self.xy
            .iter()
            .zip(&self.inactive)
            .map(|(&(x, y), &inactive)| {
                let z = if inactive { parking_z } else { active_z };
                Vec3::new(x, y, z)
            })
            .collect()
    }
}

/// Places `num_cylinders` cylinders per lane so that none shares a cell with
/// a drone, the target, another cylinder, or the masked arena rim.
#[derive(Debug, Clone)]
pub struct RejectionPlacer {
    index: GridIndex,
    num_cylinders: usize,
    obstacle_count: ObstacleCount,
}

impl RejectionPlacer {
    pub fn new(arena: &ArenaConfig) -> Self {
        Self {
            index: GridIndex::from_arena(arena),
            num_cylinders: arena.num_cylinders,
            obstacle_count: arena.obstacle_count,
        }
    }

    pub fn index(&self) -> &GridIndex {
        &self.index
    }

    /// Draws how many of the slots are active for one lane.
    pub fn draw_active_count<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        match self.obstacle_count {
            ObstacleCount::Fixed(n) => n,
            ObstacleCount::Uniform { min, max } => rng.gen_range(min..=max),
        }
    }

    /// Places the cylinders of a single lane around the given drones and target.
    pub fn place_lane<R: Rng + ?Sized>(
        &self,
        lane: usize,
        drones: &[Vec3],
        target: &Vec3,
        rng: &mut R,
    ) -> Result<ObstaclePlacement, GridError> {
        let mut map = GridMap::with_boundary_mask(self.index.resolution());
        for p in drones.iter().chain(std::iter::once(target)) {
            map.occupy(self.index.cell_of(p));
        }

        let active = self.draw_active_count(rng);
        let inactive = (0..self.num_cylinders).map(|j| j >= active).collect();

        let cells = select_unoccupied_lane(&map, lane, self.num_cylinders, rng)?;
        let xy = cells
            .into_iter()
            .map(|cell| self.index.to_continuous(cell))
            .collect();
        Ok(ObstaclePlacement { xy, inactive })
    }

    /// Places cylinders for every lane.
    ///
    /// # Panics
    ///
    /// Panics if `drones` and `targets` have different lane counts.
    pub fn place<R: Rng + ?Sized>(
        &self,
        drones: &[Vec<Vec3>],
        targets: &[Vec3],
        rng: &mut R,
    ) -> Result<Vec<ObstaclePlacement>, GridError> {
        assert_eq!(drones.len(), targets.len(), "lane count mismatch");
        drones
            .iter()
            .zip(targets)
            .enumerate()
            .map(|(lane, (d, t))| self.place_lane(lane, d, t, rng))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;
    use crate::rng::seeded_rng;

    fn four_drones() -> (Vec<Vec3>, Vec3) {
        let drones = vec![
            Vec3::new(0.6, 0.0, 0.5),
            Vec3::new(0.4, 0.0, 0.5),
            Vec3::new(0.4, -0.2, 0.5),
            Vec3::new(0.4, 0.2, 0.5),
        ];
        (drones, Vec3::new(-0.6, 0.0, 0.5))
    }

    #[test]
    fn two_active_three_parked() {
        let arena = ArenaConfig {
            obstacle_count: ObstacleCount::Fixed(2),
            ..ArenaConfig::default()
        };
        let placer = RejectionPlacer::new(&arena);
        let (drones, target) = four_drones();
        let mut rng = seeded_rng(10);
        for _ in 0..50 {
            let placement = placer.place_lane(0, &drones, &target, &mut rng).unwrap();
            assert_eq!(placement.xy.len(), 5);
            assert_eq!(placement.inactive.iter().filter(|&&i| i).count(), 3);
            assert_eq!(placement.num_active(), 2);
        }
    }

    #[test]
    fn cylinders_avoid_every_entity() {
        let arena = ArenaConfig::default();
        let placer = RejectionPlacer::new(&arena);
        let index = placer.index();
        let (drones, target) = four_drones();
        let mut rng = seeded_rng(11);
        let lanes = vec![drones.clone(); 20];
        let targets = vec![target; 20];
        let placements = placer.place(&lanes, &targets, &mut rng).unwrap();
        let base = GridMap::with_boundary_mask(index.resolution());
        for placement in placements {
            let mut cells: Vec<Cell> = drones.iter().map(|d| index.cell_of(d)).collect();
            cells.push(index.cell_of(&target));
            cells.extend(placement.xy.iter().map(|&(x, y)| index.to_cell(x, y)));
            assert!(base.admits(&cells));
        }
    }

    #[test]
    fn uniform_count_stays_in_range() {
        let arena = ArenaConfig {
            obstacle_count: ObstacleCount::Uniform { min: 1, max: 3 },
            ..ArenaConfig::default()
        };
        let placer = RejectionPlacer::new(&arena);
        let mut rng = seeded_rng(12);
        let mut seen = [false; 6];
        for _ in 0..300 {
            let n = placer.draw_active_count(&mut rng);
            assert!((1..=3).contains(&n));
            seen[n] = true;
        }
        assert!(seen[1] && seen[2] && seen[3]);
    }

    #[test]
    fn parked_cylinders_sink() {
        let placement = ObstaclePlacement {
            xy: vec![(0.2, 0.0), (0.0, 0.2)],
            inactive: vec![false, true],
        };
        let cylinders = placement.cylinders(0.6, -20.0);
        assert_eq!(cylinders[0], Vec3::new(0.2, 0.0, 0.6));
        assert_eq!(cylinders[1], Vec3::new(0.0, 0.2, -20.0));
    }

    #[test]
    fn overcrowded_grid_is_a_hard_error() {
        let arena = ArenaConfig {
            num_cylinders: 60,
            obstacle_count: ObstacleCount::Fixed(0),
            ..ArenaConfig::default()
        };
        let placer = RejectionPlacer::new(&arena);
        let (drones, target) = four_drones();
        let mut rng = seeded_rng(13);
        let err = placer.place_lane(7, &drones, &target, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            GridError::InsufficientFreeCells {
                lane: 7,
                required: 60,
                ..
            }
        ));
    }
}
