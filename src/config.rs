//! Configuration for the arena geometry and the curriculum loop.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::task::TaskLayout;

/// Errors raised when a configuration is internally inconsistent.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("Obstacle count range {min}..={max} does not fit {num_cylinders} cylinder slots")]
    ObstacleRange {
        min: usize,
        max: usize,
        num_cylinders: usize,
    },

    #[error("Uniform ratio must lie in [0, 1], got {0}")]
    RatioOutOfRange(f64),

    #[error("Reward window is empty: R_min = {r_min} > R_max = {r_max}")]
    EmptyRewardWindow { r_min: f64, r_max: f64 },

    #[error("{0} must be at least 1")]
    ZeroCount(&'static str),

    #[error("Arena of radius {radius} yields an empty grid with cell size {cell_size}")]
    EmptyGrid { radius: f64, cell_size: f64 },

    #[error("Parked cylinders must sit below the floor, got parking_z = {0}")]
    ParkingAboveFloor(f64),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// How many of the cylinder slots are active in a freshly placed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ObstacleCount {
    /// Every task gets exactly this many active cylinders.
    Fixed(usize),
    /// Drawn uniformly from `min..=max` per task.
    Uniform { min: usize, max: usize },
}

/// Policy used to shrink the history buffer back to capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EvictionPolicy {
    /// Keep the most recent `capacity` tasks.
    Fifo,
    /// Keep a diverse subset chosen by farthest-point selection.
    #[default]
    FarthestPoint,
}

/// Arena geometry and entity counts.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArenaConfig {
    /// Number of pursuing drones.
    pub num_agents: usize,
    /// Number of cylinder slots (active and parked).
    pub num_cylinders: usize,
    /// Radius of the circular arena.
    pub arena_radius: f64,
    /// Ceiling of the flight volume.
    pub max_height: f64,
    /// Radius of every cylinder.
    pub cylinder_radius: f64,
    /// Height of every cylinder.
    pub cylinder_height: f64,
    /// Depth at which inactive cylinders are parked.
    pub parking_z: f64,
    /// Clearance kept between spawned entities and the arena wall.
    pub margin: f64,
    /// Half-width of the spawn band around `max_height / 2`.
    pub spawn_z_jitter: f64,
    /// Distribution of the number of active cylinders.
    pub obstacle_count: ObstacleCount,
}

impl ArenaConfig {
    /// Side length of one grid cell (one cylinder diameter).
    pub fn cell_size(&self) -> f64 {
        2.0 * self.cylinder_radius
    }

    /// Number of cells along each side of the occupancy grid.
    pub fn grid_resolution(&self) -> usize {
        (self.arena_radius * 2.0 / self.cell_size()) as usize
    }

    /// Continuous coordinates converted from grid cells are clamped to `±boundary`.
    pub fn placement_boundary(&self) -> f64 {
        self.arena_radius - self.margin
    }

    /// Half extent of the square spawn area inscribed in the arena.
    pub fn spawn_half_extent(&self) -> f64 {
        self.arena_radius / std::f64::consts::SQRT_2 - self.margin
    }

    /// Height band `[lo, hi]` used for drones and target.
    pub fn spawn_z_range(&self) -> (f64, f64) {
        let mid = self.max_height / 2.0;
        (mid - self.spawn_z_jitter, mid + self.spawn_z_jitter)
    }

    /// Largest cylinder xy magnitude that is still a whole number of cells.
    pub fn cylinder_boundary(&self) -> f64 {
        let cell = self.cell_size();
        (self.arena_radius / cell).floor() * cell
    }

    /// Height of the centre of a standing cylinder.
    pub fn active_cylinder_z(&self) -> f64 {
        0.5 * self.cylinder_height
    }

    /// Layout of the task vectors for this arena.
    pub fn task_layout(&self) -> TaskLayout {
        TaskLayout::new(self.num_agents, self.num_cylinders)
    }

    /// Checks the geometry and the obstacle-count distribution.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("arena_radius", self.arena_radius),
            ("max_height", self.max_height),
            ("cylinder_radius", self.cylinder_radius),
            ("cylinder_height", self.cylinder_height),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        if !(self.spawn_half_extent() > 0.0) {
            return Err(ConfigError::NonPositive {
                name: "spawn_half_extent",
                value: self.spawn_half_extent(),
            });
        }
        if self.spawn_z_jitter < 0.0 {
            return Err(ConfigError::NonPositive {
                name: "spawn_z_jitter",
                value: self.spawn_z_jitter,
            });
        }
        if !(self.parking_z < 0.0) {
            return Err(ConfigError::ParkingAboveFloor(self.parking_z));
        }
        if self.num_agents == 0 {
            return Err(ConfigError::ZeroCount("num_agents"));
        }
        if self.grid_resolution() == 0 {
            return Err(ConfigError::EmptyGrid {
                radius: self.arena_radius,
                cell_size: self.cell_size(),
            });
        }
        let (min, max) = match self.obstacle_count {
            ObstacleCount::Fixed(n) => (n, n),
            ObstacleCount::Uniform { min, max } => (min, max),
        };
        if min > max || max > self.num_cylinders {
            return Err(ConfigError::ObstacleRange {
                min,
                max,
                num_cylinders: self.num_cylinders,
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            num_agents: 4,
            num_cylinders: 5,
            arena_radius: 0.9,
            max_height: 1.2,
            cylinder_radius: 0.1,
            cylinder_height: 1.2,
            parking_z: -20.0,
            margin: 0.1,
            spawn_z_jitter: 0.1,
            obstacle_count: ObstacleCount::Uniform { min: 0, max: 5 },
        }
    }
}

/// Curriculum and history-buffer settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CurriculumConfig {
    /// Maximum number of tasks kept in the history buffer.
    pub buffer_capacity: usize,
    /// Eviction policy applied when the history overflows.
    pub eviction: EvictionPolicy,
    /// Number of resets a batch is reused for before weights are flushed.
    pub eval_iter: usize,
    /// Initial fraction of each batch drawn uniformly.
    pub ratio_unif: f64,
    /// Lower edge of the admission window on averaged weights.
    pub r_min: f64,
    /// Upper edge of the admission window on averaged weights.
    pub r_max: f64,
    /// Batch success rate above which curation is abandoned.
    pub success_threshold: f64,
    /// Whether the nearby sampler also shifts cylinders by whole cells.
    pub expand_obstacles: bool,
    /// Scale of the uniform perturbation applied to drones and target.
    pub expand_step: f64,
    /// Perturbation attempts per nearby candidate.
    pub nearby_attempts: usize,
    /// Draw attempts per lane when sampling drones and target uniformly.
    pub uniform_attempts: usize,
    /// Seed the history with easy cases at construction.
    pub init_easy: bool,
    /// Perturb buffered tasks before reuse instead of replaying them verbatim.
    pub perturb_buffer_tasks: bool,
    /// Stabilizer for min-max normalization.
    pub eps: f64,
}

impl CurriculumConfig {
    /// Checks ranges and counts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_capacity == 0 {
            return Err(ConfigError::ZeroCount("buffer_capacity"));
        }
        if self.eval_iter == 0 {
            return Err(ConfigError::ZeroCount("eval_iter"));
        }
        if self.nearby_attempts == 0 {
            return Err(ConfigError::ZeroCount("nearby_attempts"));
        }
        if self.uniform_attempts == 0 {
            return Err(ConfigError::ZeroCount("uniform_attempts"));
        }
        if !(0.0..=1.0).contains(&self.ratio_unif) {
            return Err(ConfigError::RatioOutOfRange(self.ratio_unif));
        }
        if self.r_min > self.r_max {
            return Err(ConfigError::EmptyRewardWindow {
                r_min: self.r_min,
                r_max: self.r_max,
            });
        }
        if !(self.eps > 0.0) {
            return Err(ConfigError::NonPositive {
                name: "eps",
                value: self.eps,
            });
        }
        Ok(())
    }
}

impl Default for CurriculumConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 5000,
            eviction: EvictionPolicy::FarthestPoint,
            eval_iter: 1,
            ratio_unif: 0.5,
            r_min: 0.0,
            r_max: 0.5,
            success_threshold: 0.9,
            expand_obstacles: true,
            expand_step: 0.1,
            nearby_attempts: 10,
            uniform_attempts: 100,
            init_easy: true,
            perturb_buffer_tasks: true,
            eps: 1e-5,
        }
    }
}

/// Complete configuration of a task generator.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeneratorConfig {
    pub arena: ArenaConfig,
    pub curriculum: CurriculumConfig,
    /// Seed of the controller's random source.
    pub seed: u64,
}

impl GeneratorConfig {
    /// Validates both sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.arena.validate()?;
        self.curriculum.validate()
    }

    /// Parses and validates a JSON configuration.
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
