//! Counters reported back to the simulation after every episode.

use std::fmt;

use crate::task::Task;

/// Share and mean flushed weight of the lanes with `active` standing cylinders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleStats {
    pub active: usize,
    /// Fraction of the flushed lanes with this many active cylinders.
    pub ratio: f64,
    /// Mean averaged weight of those lanes, `0.0` when there are none.
    pub success: f64,
}

/// Snapshot of the curriculum state.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostics {
    /// Current number of tasks in the history.
    pub history_size: usize,
    /// Current fraction of each batch drawn uniformly.
    pub ratio_unif: f64,
    /// Tasks admitted into the history at the last flush.
    pub admitted_last_flush: usize,
    /// Uniform slots of the current batch (they come first).
    pub num_unif: usize,
    /// Buffer slots of the current batch that had to be padded.
    pub padded_last_batch: usize,
    /// Success rate over the uniform slots of the last episode.
    pub success_unif: Option<f64>,
    /// Success rate over the buffer slots of the last episode.
    pub success_buffer: Option<f64>,
    /// Per active-cylinder-count breakdown computed at the last flush.
    pub obstacle_stats: Vec<ObstacleStats>,
}

/// Result of [`CurriculumController::report_episode`](super::CurriculumController::report_episode).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeReport {
    /// Mean success over the whole batch.
    pub success_rate: f64,
    /// The uniform ratio was forced to 1.0 by this episode.
    pub ratcheted: bool,
    /// Tasks admitted into the history, if this episode triggered a flush.
    pub admitted: Option<usize>,
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Breaks the flushed lanes down by active-cylinder count, `0..=num_cylinders`.
pub(crate) fn obstacle_stats(states: &[Task], weights: &[f64], num_cylinders: usize) -> Vec<ObstacleStats> {
    let total = states.len();
    (0..=num_cylinders)
        .map(|active| {
            let matching: Vec<f64> = states
                .iter()
                .zip(weights)
                .filter(|(task, _)| task.num_active_cylinders() == active)
                .map(|(_, &w)| w)
                .collect();
            let ratio = if total > 0 {
                matching.len() as f64 / total as f64
            } else {
                0.0
            };
            ObstacleStats {
                active,
                ratio,
                success: mean(&matching).unwrap_or(0.0),
            }
        })
        .collect()
}

fn fmt_rate(rate: Option<f64>) -> String {
    rate.map_or_else(|| "-".to_string(), |r| format!("{r:.3}"))
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  History size:        {}", self.history_size)?;
        writeln!(f, "  Uniform ratio:       {:.2}", self.ratio_unif)?;
        writeln!(f, "  Admitted last flush: {}", self.admitted_last_flush)?;
        writeln!(f, "  Success (uniform):   {}", fmt_rate(self.success_unif))?;
        write!(f, "  Success (buffer):    {}", fmt_rate(self.success_buffer))?;
        for s in &self.obstacle_stats {
            write!(
                f,
                "\n  {} cylinders:         ratio {:.2}, success {:.2}",
                s.active, s.ratio, s.success
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec3;

    fn task_with_active(active: usize) -> Task {
        let cylinders: Vec<Vec3> = (0..2)
            .map(|j| Vec3::new(0.0, 0.0, if j < active { 0.6 } else { -20.0 }))
            .collect();
        Task::from_parts(&[Vec3::default()], Vec3::default(), &cylinders)
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 0.0]), Some(0.5));
    }

    #[test]
    fn stats_partition_lanes() {
        let states = vec![task_with_active(0), task_with_active(2), task_with_active(2), task_with_active(0)];
        let weights = [1.0, 0.5, 0.0, 0.0];
        let stats = obstacle_stats(&states, &weights, 2);
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0], ObstacleStats { active: 0, ratio: 0.5, success: 0.5 });
        assert_eq!(stats[1], ObstacleStats { active: 1, ratio: 0.0, success: 0.0 });
        assert_eq!(stats[2], ObstacleStats { active: 2, ratio: 0.5, success: 0.25 });
    }

    #[test]
    fn display_lists_counters() {
        let d = Diagnostics {
            history_size: 12,
            ratio_unif: 0.5,
            admitted_last_flush: 3,
            num_unif: 4,
            padded_last_batch: 0,
            success_unif: Some(1.0),
            success_buffer: None,
            obstacle_stats: Vec::new(),
        };
        let text = d.to_string();
        assert!(text.contains("History size:        12"));
        assert!(text.contains("Success (buffer):    -"));
    }
}
