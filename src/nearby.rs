//! Local perturbation of curated tasks.
//!
//! [`NearbySampler`] draws base tasks from the history, jitters them, clips
//! every coordinate to its bound and keeps only candidates whose grid cells
//! are still collision-free. Slots that run out of attempts are backfilled
//! from the accepted candidates, so a request for `n` tasks yields `n` tasks.

use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

use crate::buffer::{BufferError, TaskBuffer};
use crate::config::{ArenaConfig, CurriculumConfig};
use crate::grid::{Cell, GridIndex, GridMap};
use crate::task::{Task, TaskLayout};

/// Errors raised by [`NearbySampler::sample`].
#[derive(Debug, Error)]
pub enum SamplingError {
    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error("No nearby candidate accepted for any of {requested} slots ({attempts} attempts each)")]
    NoAcceptedCandidates { requested: usize, attempts: usize },
}

/// Result of a single perturbation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    Accepted(Task),
    Rejected,
}

/// Tasks returned by [`NearbySampler::sample`] with their provenance counts.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyOutcome {
    pub tasks: Vec<Task>,
    /// Slots filled by an accepted perturbation.
    pub accepted: usize,
    /// Slots filled by resampling accepted candidates.
    pub padded: usize,
}

#[derive(Debug, Clone)]
pub struct NearbySampler {
    layout: TaskLayout,
    index: GridIndex,
    base_map: GridMap,
    bounds: Vec<(f64, f64)>,
    max_attempts: usize,
    expand_obstacles: bool,
    expand_step: f64,
}

impl NearbySampler {
    pub fn new(arena: &ArenaConfig, curriculum: &CurriculumConfig) -> Self {
        let layout = arena.task_layout();
        let index = GridIndex::from_arena(arena);
        let base_map = GridMap::with_boundary_mask(index.resolution());

        let xy = arena.spawn_half_extent();
        let agent = [(-xy, xy), (-xy, xy), arena.spawn_z_range()];
        let c = arena.cylinder_boundary();
        let cylinder = [(-c, c), (-c, c), (arena.parking_z, arena.active_cylinder_z())];

        let mut bounds = Vec::with_capacity(layout.task_dim());
        for _ in 0..=layout.num_agents {
            bounds.extend_from_slice(&agent);
        }
        for _ in 0..layout.num_cylinders {
            bounds.extend_from_slice(&cylinder);
        }

        Self {
            layout,
            index,
            base_map,
            bounds,
            max_attempts: curriculum.nearby_attempts,
            expand_obstacles: curriculum.expand_obstacles,
            expand_step: curriculum.expand_step,
        }
    }

    /// Per-coordinate `(lo, hi)` clip bounds, aligned with the task vector.
    pub fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    fn cells(&self, task: &Task) -> Vec<Cell> {
        task.drones()
            .iter()
            .chain(std::iter::once(&task.target()))
            .chain(task.cylinders().iter())
            .map(|p| self.index.cell_of(p))
            .collect()
    }

    /// One jitter-clip-check round on `base`.
    pub fn attempt<R: Rng + ?Sized>(&self, base: &Task, rng: &mut R) -> Attempt {
        let mut candidate = base.clone();
        let agent_dim = self.layout.agent_target_dim();
        let cell = self.index.cell_size();
        let values = candidate.as_mut_slice();

        for v in &mut values[..agent_dim] {
            *v += rng.gen_range(-1.0..1.0) * self.expand_step;
        }
        if self.expand_obstacles {
            for xyz in values[agent_dim..].chunks_exact_mut(3) {
                xyz[0] += rng.gen_range(-1i32..=1) as f64 * cell;
                xyz[1] += rng.gen_range(-1i32..=1) as f64 * cell;
            }
        }
        for (v, &(lo, hi)) in values.iter_mut().zip(&self.bounds) {
            *v = v.clamp(lo, hi);
        }

        if self.base_map.admits(&self.cells(&candidate)) {
            Attempt::Accepted(candidate)
        } else {
            Attempt::Rejected
        }
    }

    /// Produces exactly `n` perturbed tasks around history entries.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        buffer: &TaskBuffer,
        n: usize,
        rng: &mut R,
    ) -> Result<NearbyOutcome, SamplingError> {
        let bases = buffer.sample(n, rng)?;

        let mut tasks = Vec::with_capacity(n);
        for base in &bases {
            for _ in 0..self.max_attempts {
                if let Attempt::Accepted(task) = self.attempt(base, rng) {
                    tasks.push(task);
                    break;
                }
            }
        }

        let accepted = tasks.len();
        if accepted == 0 && n > 0 {
            return Err(SamplingError::NoAcceptedCandidates {
                requested: n,
                attempts: self.max_attempts,
            });
        }
        let padded = n - accepted;
        if padded > 0 {
            warn!(
                requested = n,
                accepted, padded, "nearby sampler fell short, padding from accepted tasks"
            );
            for _ in 0..padded {
                let pick = tasks[rng.gen_range(0..accepted)].clone();
                tasks.push(pick);
            }
        } else {
            debug!(requested = n, "nearby sampler filled every slot");
        }

        Ok(NearbyOutcome {
            tasks,
            accepted,
            padded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvictionPolicy;
    use crate::geometry::Vec3;
    use crate::placement::UniformTaskSampler;
    use crate::rng::seeded_rng;
    use proptest::prelude::*;

    fn seeded_buffer(arena: &ArenaConfig, size: usize, seed: u64) -> TaskBuffer {
        let curriculum = CurriculumConfig::default();
        let mut buffer = TaskBuffer::from_config(arena, &curriculum);
        let mut rng = seeded_rng(seed);
        let tasks = UniformTaskSampler::new(arena, 100)
            .sample(size, &mut rng)
            .unwrap();
        buffer.init_history(tasks, &mut rng).unwrap();
        buffer
    }

    /// A history entry whose drones all share one cell.
    fn stacked_buffer(arena: &ArenaConfig) -> TaskBuffer {
        let layout = arena.task_layout();
        let drones = vec![Vec3::new(0.2, 0.0, 0.6); layout.num_agents];
        let task = Task::from_parts(&drones, Vec3::new(-0.4, 0.0, 0.6), &[]);
        let mut buffer = TaskBuffer::new(layout, 10, EvictionPolicy::Fifo, 1e-5);
        buffer
            .init_history(vec![task], &mut seeded_rng(0))
            .unwrap();
        buffer
    }

    fn within_bounds(sampler: &NearbySampler, task: &Task) -> bool {
        task.as_slice()
            .iter()
            .zip(sampler.bounds())
            .all(|(v, (lo, hi))| v >= lo && v <= hi)
    }

    #[test]
    fn bounds_cover_every_coordinate() {
        let arena = ArenaConfig::default();
        let sampler = NearbySampler::new(&arena, &CurriculumConfig::default());
        let bounds = sampler.bounds();
        assert_eq!(bounds.len(), 30);
        let xy = arena.spawn_half_extent();
        assert_eq!(bounds[0], (-xy, xy));
        assert_eq!(bounds[14], arena.spawn_z_range());
        assert_eq!(bounds[15], (-0.8, 0.8));
        assert_eq!(bounds[17], (-20.0, 0.6));
    }

    #[test]
    fn empty_history_is_an_error() {
        let arena = ArenaConfig::default();
        let curriculum = CurriculumConfig::default();
        let sampler = NearbySampler::new(&arena, &curriculum);
        let buffer = TaskBuffer::from_config(&arena, &curriculum);
        let mut rng = seeded_rng(1);
        assert!(matches!(
            sampler.sample(&buffer, 4, &mut rng),
            Err(SamplingError::Buffer(BufferError::EmptyHistory))
        ));
    }

    #[test]
    fn zero_step_replays_history() {
        let arena = ArenaConfig::default();
        let curriculum = CurriculumConfig {
            expand_step: 0.0,
            expand_obstacles: false,
            ..CurriculumConfig::default()
        };
        let sampler = NearbySampler::new(&arena, &curriculum);
        let buffer = seeded_buffer(&arena, 16, 2);
        let mut rng = seeded_rng(3);
        let outcome = sampler.sample(&buffer, 32, &mut rng).unwrap();
        assert_eq!(outcome.accepted, 32);
        assert_eq!(outcome.padded, 0);
        assert!(outcome.tasks.iter().all(|t| buffer.history().contains(t)));
    }

    #[test]
    fn colliding_history_is_a_hard_error() {
        let arena = ArenaConfig {
            num_cylinders: 0,
            obstacle_count: crate::config::ObstacleCount::Fixed(0),
            ..ArenaConfig::default()
        };
        let curriculum = CurriculumConfig {
            expand_step: 0.0,
            ..CurriculumConfig::default()
        };
        let sampler = NearbySampler::new(&arena, &curriculum);
        let buffer = stacked_buffer(&arena);
        let mut rng = seeded_rng(4);
        assert!(matches!(
            sampler.sample(&buffer, 3, &mut rng),
            Err(SamplingError::NoAcceptedCandidates {
                requested: 3,
                attempts: 10
            })
        ));
    }

    #[test]
    fn padding_reuses_only_admissible_tasks() {
        let arena = ArenaConfig {
            num_cylinders: 0,
            obstacle_count: crate::config::ObstacleCount::Fixed(0),
            ..ArenaConfig::default()
        };
        let curriculum = CurriculumConfig {
            expand_step: 0.0,
            expand_obstacles: false,
            ..CurriculumConfig::default()
        };
        let sampler = NearbySampler::new(&arena, &curriculum);

        let good = Task::from_parts(
            &[
                Vec3::new(0.2, 0.0, 0.6),
                Vec3::new(0.4, 0.0, 0.6),
                Vec3::new(0.2, 0.2, 0.6),
                Vec3::new(0.4, 0.2, 0.6),
            ],
            Vec3::new(-0.4, 0.0, 0.6),
            &[],
        );
        let mut buffer = stacked_buffer(&arena);
        buffer
            .insert_history(vec![good.clone()], &mut seeded_rng(0))
            .unwrap();
        assert_eq!(buffer.len(), 2);

        let outcome = sampler.sample(&buffer, 20, &mut seeded_rng(8)).unwrap();
        assert_eq!(outcome.tasks.len(), 20);
        assert!(outcome.accepted > 0);
        assert!(outcome.padded > 0);
        for task in &outcome.tasks {
            assert_eq!(task, &good);
            assert!(sampler.base_map.admits(&sampler.cells(task)));
        }
    }

    #[test]
    fn rejected_attempt_is_reported() {
        let arena = ArenaConfig {
            num_cylinders: 0,
            obstacle_count: crate::config::ObstacleCount::Fixed(0),
            ..ArenaConfig::default()
        };
        let curriculum = CurriculumConfig {
            expand_step: 0.0,
            ..CurriculumConfig::default()
        };
        let sampler = NearbySampler::new(&arena, &curriculum);
        let base = stacked_buffer(&arena).history()[0].clone();
        assert_eq!(sampler.attempt(&base, &mut seeded_rng(5)), Attempt::Rejected);
    }

    #[test]
    fn accepted_tasks_are_collision_free() {
        let arena = ArenaConfig::default();
        let sampler = NearbySampler::new(&arena, &CurriculumConfig::default());
        let buffer = seeded_buffer(&arena, 64, 6);
        let index = GridIndex::from_arena(&arena);
        let base = GridMap::with_boundary_mask(index.resolution());
        let mut rng = seeded_rng(7);
        for _ in 0..200 {
            let src = &buffer.history()[rng.gen_range(0..buffer.len())];
            if let Attempt::Accepted(task) = sampler.attempt(src, &mut rng) {
                let cells: Vec<Cell> = task
                    .drones()
                    .iter()
                    .chain(std::iter::once(&task.target()))
                    .chain(task.cylinders().iter().filter(|c| c.z > 0.0))
                    .map(|p| index.cell_of(p))
                    .collect();
                assert!(base.admits(&cells));
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(30))]

        #[test]
        fn always_returns_requested_count(
            history in 1usize..8,
            n in 1usize..40,
            seed in any::<u64>(),
        ) {
            let arena = ArenaConfig::default();
            let curriculum = CurriculumConfig {
                expand_obstacles: false,
                ..CurriculumConfig::default()
            };
            let sampler = NearbySampler::new(&arena, &curriculum);
            let buffer = seeded_buffer(&arena, history, seed);
            let mut rng = seeded_rng(seed ^ 0x5eed);
            let outcome = sampler.sample(&buffer, n, &mut rng).unwrap();
            prop_assert_eq!(outcome.tasks.len(), n);
            prop_assert_eq!(outcome.accepted + outcome.padded, n);
            for task in &outcome.tasks {
                prop_assert!(within_bounds(&sampler, task));
            }
        }
    }
}
