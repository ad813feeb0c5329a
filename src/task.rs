//! Task vectors: one complete reset configuration of an episode.
//!
//! A task is stored flat as `[drone_0 xyz, …, drone_{n-1} xyz, target xyz,
//! cylinder_0 xyz, …]`, matching the row format of the persisted history.

use std::ops::Range;

use thiserror::Error;

use crate::geometry::Vec3;

/// Raised when a flat vector does not match the expected layout.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Task vector has length {actual}, expected {expected}")]
pub struct TaskDimError {
    pub expected: usize,
    pub actual: usize,
}

/// Entity counts that fix the length and slicing of a task vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskLayout {
    pub num_agents: usize,
    pub num_cylinders: usize,
}

impl TaskLayout {
    /// Creates a new layout.
    pub const fn new(num_agents: usize, num_cylinders: usize) -> Self {
        Self {
            num_agents,
            num_cylinders,
        }
    }

    /// Length of a task vector: `3 * (num_agents + 1 + num_cylinders)`.
    pub const fn task_dim(&self) -> usize {
        3 * (self.num_agents + 1 + self.num_cylinders)
    }

    /// Number of leading values that describe drones and target.
    pub const fn agent_target_dim(&self) -> usize {
        3 * (self.num_agents + 1)
    }

    /// Slice range of drone `i`.
    pub fn drone_range(&self, i: usize) -> Range<usize> {
        3 * i..3 * i + 3
    }

    /// Slice range of the target.
    pub fn target_range(&self) -> Range<usize> {
        let start = 3 * self.num_agents;
        start..start + 3
    }

    /// Slice range of cylinder `j`.
    pub fn cylinder_range(&self, j: usize) -> Range<usize> {
        let start = self.agent_target_dim() + 3 * j;
        start..start + 3
    }
}

/// A single scenario: drone, target and cylinder positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    layout: TaskLayout,
    values: Vec<f64>,
}

impl Task {
    /// Wraps a flat vector, checking its length against `layout`.
    pub fn from_vec(layout: TaskLayout, values: Vec<f64>) -> Result<Self, TaskDimError> {
        if values.len() != layout.task_dim() {
            return Err(TaskDimError {
                expected: layout.task_dim(),
                actual: values.len(),
            });
        }
        Ok(Self { layout, values })
    }

    /// Assembles a task from its entities. The layout is taken from the slice lengths.
    pub fn from_parts(drones: &[Vec3], target: Vec3, cylinders: &[Vec3]) -> Self {
        let layout = TaskLayout::new(drones.len(), cylinders.len());
        let mut values = Vec::with_capacity(layout.task_dim());
        for p in drones.iter().chain(std::iter::once(&target)).chain(cylinders) {
            values.extend_from_slice(&p.to_array());
        }
        Self { layout, values }
    }

    pub fn layout(&self) -> TaskLayout {
        self.layout
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn drone(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.values[self.layout.drone_range(i)])
    }

    pub fn drones(&self) -> Vec<Vec3> {
        (0..self.layout.num_agents).map(|i| self.drone(i)).collect()
    }

    pub fn target(&self) -> Vec3 {
        Vec3::from_slice(&self.values[self.layout.target_range()])
    }

    pub fn cylinder(&self, j: usize) -> Vec3 {
        Vec3::from_slice(&self.values[self.layout.cylinder_range(j)])
    }

    pub fn cylinders(&self) -> Vec<Vec3> {
        (0..self.layout.num_cylinders)
            .map(|j| self.cylinder(j))
            .collect()
    }

    /// A cylinder is active when it stands above the floor.
    pub fn is_cylinder_active(&self, j: usize) -> bool {
        self.cylinder(j).z > 0.0
    }

    pub fn num_active_cylinders(&self) -> usize {
        (0..self.layout.num_cylinders)
            .filter(|&j| self.is_cylinder_active(j))
            .count()
    }
}
