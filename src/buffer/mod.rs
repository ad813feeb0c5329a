//! Curation state: collected tasks, their averaged weights and the history.
//!
//! A cycle runs in three stages:
//!
//! 1. **collect**: [`TaskBuffer::insert`] and [`TaskBuffer::insert_weights`]
//!    fill temporary accumulators;
//! 2. **flush**: [`TaskBuffer::update`] averages the weights of every round and
//!    moves the accumulators into the canonical state/weight buffers;
//! 3. **curate**: [`TaskBuffer::curate`] keeps the collected tasks whose weight
//!    lies in the reward window and merges them into the history under the
//!    configured [`EvictionPolicy`].

pub mod error;
pub mod fps;
pub mod persist;

use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::{debug, info, warn};

pub use error::BufferError;

use crate::config::{ArenaConfig, CurriculumConfig, EvictionPolicy};
use crate::task::{Task, TaskDimError, TaskLayout};

/// Owned curation state. The curriculum controller is its only writer.
#[derive(Debug, Clone)]
pub struct TaskBuffer {
    layout: TaskLayout,
    capacity: usize,
    policy: EvictionPolicy,
    eps: f64,
    history: Vec<Task>,
    states: Vec<Task>,
    weights: Vec<f64>,
    pending_states: Vec<Task>,
    pending_weights: Vec<Vec<f64>>,
}

impl TaskBuffer {
    /// Creates an empty buffer.
    pub fn new(layout: TaskLayout, capacity: usize, policy: EvictionPolicy, eps: f64) -> Self {
        Self {
            layout,
            capacity,
            policy,
            eps,
            history: Vec::new(),
            states: Vec::new(),
            weights: Vec::new(),
            pending_states: Vec::new(),
            pending_weights: Vec::new(),
        }
    }

    pub fn from_config(arena: &ArenaConfig, curriculum: &CurriculumConfig) -> Self {
        Self::new(
            arena.task_layout(),
            curriculum.buffer_capacity,
            curriculum.eviction,
            curriculum.eps,
        )
    }

    fn check_layout(&self, task: &Task) -> Result<(), TaskDimError> {
        if task.layout() != self.layout {
            return Err(TaskDimError {
                expected: self.layout.task_dim(),
                actual: task.layout().task_dim(),
            });
        }
        Ok(())
    }

    /// Replaces the history with `tasks`, evicting down to capacity if needed.
    pub fn init_history<R: Rng + ?Sized>(
        &mut self,
        tasks: Vec<Task>,
        rng: &mut R,
    ) -> Result<(), BufferError> {
        self.history.clear();
        self.insert_history(tasks, rng)
    }

    /// Collects the tasks of a freshly generated batch.
    pub fn insert(&mut self, tasks: &[Task]) -> Result<(), BufferError> {
        for task in tasks {
            self.check_layout(task)?;
        }
        self.pending_states.extend_from_slice(tasks);
        Ok(())
    }

    /// Collects one round of per-task weights.
    pub fn insert_weights(&mut self, weights: &[f64]) {
        self.pending_weights.push(weights.to_vec());
    }

    /// Flushes the accumulators: every collected round is averaged
    /// element-wise into one weight per collected task.
    ///
    /// On a length mismatch nothing is modified.
    pub fn update(&mut self) -> Result<(), BufferError> {
        let expected = self.pending_states.len();
        if expected > 0 && self.pending_weights.is_empty() {
            return Err(BufferError::WeightLengthMismatch {
                expected,
                actual: 0,
            });
        }
        if let Some(actual) = self
            .pending_weights
            .iter()
            .map(Vec::len)
            .find(|&len| len != expected)
        {
            // Every pending round is dropped; collected tasks stay pending.
            self.pending_weights.clear();
            return Err(BufferError::WeightLengthMismatch { expected, actual });
        }

        let rounds = self.pending_weights.len() as f64;
        let mut averaged = vec![0.0; expected];
        for round in &self.pending_weights {
            for (acc, w) in averaged.iter_mut().zip(round) {
                *acc += w;
            }
        }
        for acc in &mut averaged {
            *acc /= rounds;
        }

        self.states = std::mem::take(&mut self.pending_states);
        self.weights = averaged;
        self.pending_weights.clear();
        debug!(tasks = self.states.len(), rounds, "flushed task buffer");
        Ok(())
    }

    /// Flushed tasks whose weight lies in `[r_min, r_max]`.
    pub fn admissible(&self, r_min: f64, r_max: f64) -> Vec<Task> {
        self.states
            .iter()
            .zip(&self.weights)
            .filter(|(_, &w)| w >= r_min && w <= r_max)
            .map(|(task, _)| task.clone())
            .collect()
    }

    /// Merges `tasks` into the history under the eviction policy.
    pub fn insert_history<R: Rng + ?Sized>(
        &mut self,
        tasks: Vec<Task>,
        rng: &mut R,
    ) -> Result<(), BufferError> {
        if tasks.is_empty() {
            return Ok(());
        }
        for task in &tasks {
            self.check_layout(task)?;
        }

        let mut pool = std::mem::take(&mut self.history);
        pool.extend(tasks);
        self.history = match self.policy {
            EvictionPolicy::Fifo => {
                let excess = pool.len().saturating_sub(self.capacity);
                pool.drain(..excess);
                pool
            }
            EvictionPolicy::FarthestPoint if pool.len() > self.capacity => {
                self.farthest_subset(pool, rng)
            }
            EvictionPolicy::FarthestPoint => pool,
        };
        Ok(())
    }

    fn farthest_subset<R: Rng + ?Sized>(&self, pool: Vec<Task>, rng: &mut R) -> Vec<Task> {
        let rows: Vec<&[f64]> = pool.iter().map(Task::as_slice).collect();
        let normalized = fps::normalize_features(&rows, self.eps);
        let start = rng.gen_range(0..pool.len());
        let keep = fps::farthest_point_indices(&normalized, self.capacity, start);

        let mut slots: Vec<Option<Task>> = pool.into_iter().map(Some).collect();
        keep.into_iter().filter_map(|i| slots[i].take()).collect()
    }

    /// Filters the flushed tasks by the reward window and merges the survivors.
    /// Returns how many were admitted.
    pub fn curate<R: Rng + ?Sized>(
        &mut self,
        r_min: f64,
        r_max: f64,
        rng: &mut R,
    ) -> Result<usize, BufferError> {
        let admitted = self.admissible(r_min, r_max);
        let count = admitted.len();
        self.insert_history(admitted, rng)?;
        info!(
            admitted = count,
            collected = self.states.len(),
            history = self.history.len(),
            "curated task history"
        );
        Ok(count)
    }

    /// Draws `n` history tasks uniformly with replacement.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<Task>, BufferError> {
        if self.history.is_empty() {
            return Err(BufferError::EmptyHistory);
        }
        Ok((0..n)
            .map(|_| self.history[rng.gen_range(0..self.history.len())].clone())
            .collect())
    }

    pub fn layout(&self) -> TaskLayout {
        self.layout
    }

    pub fn history(&self) -> &[Task] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Tasks of the last flush.
    pub fn states(&self) -> &[Task] {
        &self.states
    }

    /// Averaged weights of the last flush, aligned with [`Self::states`].
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Writes the history to `dir/history_{iteration}.npy`.
    pub fn save(&self, dir: &Path, iteration: u64) -> Result<PathBuf, BufferError> {
        let path = dir.join(format!("history_{iteration}.npy"));
        persist::write_matrix(
            &path,
            self.layout.task_dim(),
            self.history.iter().map(Task::as_slice),
        )?;
        info!(path = %path.display(), tasks = self.history.len(), "saved task history");
        Ok(path)
    }

    /// Replaces the history with the rows of a file written by [`Self::save`].
    ///
    /// Files longer than the capacity keep their most recent rows.
    pub fn load_history(&mut self, path: &Path) -> Result<usize, BufferError> {
        let matrix = persist::read_matrix(path)?;
        if matrix.cols != self.layout.task_dim() {
            return Err(TaskDimError {
                expected: self.layout.task_dim(),
                actual: matrix.cols,
            }
            .into());
        }
        let skip = matrix.rows.saturating_sub(self.capacity);
        if skip > 0 {
            warn!(
                path = %path.display(),
                rows = matrix.rows,
                capacity = self.capacity,
                "history file exceeds capacity, dropping oldest rows"
            );
        }
        self.history = (skip..matrix.rows)
            .map(|i| Task::from_vec(self.layout, matrix.row(i).to_vec()))
            .collect::<Result<_, _>>()?;
        info!(path = %path.display(), tasks = self.history.len(), "loaded task history");
        Ok(self.history.len())
    }
}
