use std::path::{Path, PathBuf};

use tracing::info;

use super::diagnostics::{mean, obstacle_stats, Diagnostics, EpisodeReport, ObstacleStats};
use super::error::CurriculumError;
use crate::buffer::TaskBuffer;
use crate::config::GeneratorConfig;
use crate::nearby::NearbySampler;
use crate::placement::{EasyCaseGenerator, UniformTaskSampler};
use crate::rng::{seeded_rng, TaskRng};
use crate::task::Task;

/// Mixes uniform and curated tasks into reset batches and feeds episode
/// outcomes back into the [`TaskBuffer`].
///
/// A generated batch is replayed for `eval_iter` resets. Every reported
/// episode adds one round of weights; after `eval_iter` episodes the weights
/// are flushed and the history is curated.
#[derive(Debug)]
pub struct CurriculumController {
    config: GeneratorConfig,
    rng: TaskRng,
    buffer: TaskBuffer,
    uniform: UniformTaskSampler,
    nearby: NearbySampler,
    ratio_unif: f64,
    update_iter: usize,
    batch: Vec<Task>,
    /// Cleared by a flush; episodes are only accepted while set.
    batch_open: bool,
    num_unif: usize,
    padded_last_batch: usize,
    admitted_last_flush: usize,
    success_unif: Option<f64>,
    success_buffer: Option<f64>,
    obstacle_stats: Vec<ObstacleStats>,
}

impl CurriculumController {
    /// Validates `config` and, when `init_easy` is set, fills the history
    /// with easy cases.
    pub fn new(config: GeneratorConfig) -> Result<Self, CurriculumError> {
        config.validate()?;
        let arena = &config.arena;
        let curriculum = &config.curriculum;

        let mut rng = seeded_rng(config.seed);
        let mut buffer = TaskBuffer::from_config(arena, curriculum);
        if curriculum.init_easy {
            let easy = EasyCaseGenerator::new(arena).generate(curriculum.buffer_capacity, &mut rng)?;
            buffer.init_history(easy, &mut rng)?;
            info!(tasks = buffer.len(), "seeded history with easy cases");
        }

        Ok(Self {
            uniform: UniformTaskSampler::new(arena, curriculum.uniform_attempts),
            nearby: NearbySampler::new(arena, curriculum),
            ratio_unif: curriculum.ratio_unif,
            rng,
            buffer,
            update_iter: 0,
            batch: Vec::new(),
            batch_open: false,
            num_unif: 0,
            padded_last_batch: 0,
            admitted_last_flush: 0,
            success_unif: None,
            success_buffer: None,
            obstacle_stats: Vec::new(),
            config,
        })
    }

    /// Tasks for the next `batch_size` lanes, uniform slots first.
    ///
    /// A new batch is generated only at the start of an evaluation cycle;
    /// within a cycle the same batch is returned.
    pub fn reset(&mut self, batch_size: usize) -> Result<&[Task], CurriculumError> {
        if self.update_iter == 0 {
            self.generate(batch_size)?;
        } else if self.batch.len() != batch_size {
            return Err(CurriculumError::BatchSizeChanged {
                expected: self.batch.len(),
                actual: batch_size,
            });
        }
        Ok(&self.batch)
    }

    fn generate(&mut self, batch_size: usize) -> Result<(), CurriculumError> {
        let wanted = (batch_size as f64 * (1.0 - self.ratio_unif)).floor() as usize;
        let num_buffer = self.buffer.len().min(wanted);
        let num_unif = batch_size - num_buffer;

        let mut tasks = self.uniform.sample(num_unif, &mut self.rng)?;
        self.padded_last_batch = 0;
        if num_buffer > 0 {
            if self.config.curriculum.perturb_buffer_tasks {
                let outcome = self.nearby.sample(&self.buffer, num_buffer, &mut self.rng)?;
                self.padded_last_batch = outcome.padded;
                tasks.extend(outcome.tasks);
            } else {
                tasks.extend(self.buffer.sample(num_buffer, &mut self.rng)?);
            }
        }

        self.buffer.insert(&tasks)?;
        self.batch = tasks;
        self.batch_open = true;
        self.num_unif = num_unif;
        Ok(())
    }

    /// Records one episode of per-lane success weights for the current batch.
    ///
    /// Once a flush closes the cycle, further reports fail with
    /// [`CurriculumError::NoActiveBatch`] until the next [`reset`](Self::reset).
    pub fn report_episode(&mut self, success: &[f64]) -> Result<EpisodeReport, CurriculumError> {
        if !self.batch_open {
            return Err(CurriculumError::NoActiveBatch);
        }
        if success.len() != self.batch.len() {
            return Err(CurriculumError::SuccessLengthMismatch {
                expected: self.batch.len(),
                actual: success.len(),
            });
        }

        let success_rate = mean(success).unwrap_or(0.0);
        let ratcheted =
            success_rate > self.config.curriculum.success_threshold && self.ratio_unif < 1.0;
        if ratcheted {
            self.ratio_unif = 1.0;
            info!(success_rate, "learner mastered the history, switching to uniform tasks");
        }
        let (unif, buffered) = success.split_at(self.num_unif);
        self.success_unif = mean(unif);
        self.success_buffer = mean(buffered);

        self.buffer.insert_weights(success);
        self.update_iter += 1;

        let mut admitted = None;
        if self.update_iter >= self.config.curriculum.eval_iter {
            self.update_iter = 0;
            self.batch_open = false;
            admitted = Some(self.flush()?);
        }

        Ok(EpisodeReport {
            success_rate,
            ratcheted,
            admitted,
        })
    }

    fn flush(&mut self) -> Result<usize, CurriculumError> {
        self.buffer.update()?;
        self.obstacle_stats = obstacle_stats(
            self.buffer.states(),
            self.buffer.weights(),
            self.config.arena.num_cylinders,
        );
        let curriculum = &self.config.curriculum;
        let admitted = self
            .buffer
            .curate(curriculum.r_min, curriculum.r_max, &mut self.rng)?;
        self.admitted_last_flush = admitted;
        Ok(admitted)
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            history_size: self.buffer.len(),
            ratio_unif: self.ratio_unif,
            admitted_last_flush: self.admitted_last_flush,
            num_unif: self.num_unif,
            padded_last_batch: self.padded_last_batch,
            success_unif: self.success_unif,
            success_buffer: self.success_buffer,
            obstacle_stats: self.obstacle_stats.clone(),
        }
    }

    /// Writes the history to `dir/history_{iteration}.npy`.
    pub fn save_history(&self, dir: &Path, iteration: u64) -> Result<PathBuf, CurriculumError> {
        Ok(self.buffer.save(dir, iteration)?)
    }

    /// Resumes from a history written by [`Self::save_history`].
    pub fn load_history(&mut self, path: &Path) -> Result<usize, CurriculumError> {
        Ok(self.buffer.load_history(path)?)
    }

    pub fn buffer(&self) -> &TaskBuffer {
        &self.buffer
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn ratio_unif(&self) -> f64 {
        self.ratio_unif
    }

    /// Current batch, empty before the first reset.
    pub fn batch(&self) -> &[Task] {
        &self.batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, CurriculumConfig, EvictionPolicy};

    fn config(capacity: usize) -> GeneratorConfig {
        GeneratorConfig {
            curriculum: CurriculumConfig {
                buffer_capacity: capacity,
                ..CurriculumConfig::default()
            },
            seed: 7,
            ..GeneratorConfig::default()
        }
    }

    fn controller(config: GeneratorConfig) -> CurriculumController {
        CurriculumController::new(config).unwrap()
    }

    #[test]
    fn easy_cases_fill_history() {
        let c = controller(config(64));
        assert_eq!(c.buffer().len(), 64);
        assert_eq!(c.diagnostics().history_size, 64);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = config(64);
        cfg.curriculum.ratio_unif = 1.5;
        assert!(matches!(
            CurriculumController::new(cfg),
            Err(CurriculumError::Config(ConfigError::RatioOutOfRange(_)))
        ));
    }

    #[test]
    fn batch_splits_by_ratio() {
        let mut c = controller(config(64));
        let batch = c.reset(16).unwrap();
        assert_eq!(batch.len(), 16);
        assert_eq!(c.diagnostics().num_unif, 8);
    }

    #[test]
    fn empty_history_means_uniform_batch() {
        let mut cfg = config(64);
        cfg.curriculum.init_easy = false;
        let mut c = controller(cfg);
        c.reset(10).unwrap();
        assert_eq!(c.diagnostics().num_unif, 10);
    }

    #[test]
    fn batch_is_reused_for_eval_iter_resets() {
        let mut cfg = config(64);
        cfg.curriculum.eval_iter = 3;
        let mut c = controller(cfg);
        let first = c.reset(8).unwrap().to_vec();
        for round in 0..2 {
            let report = c.report_episode(&[0.0; 8]).unwrap();
            assert_eq!(report.admitted, None, "round {round}");
            assert_eq!(c.reset(8).unwrap(), first.as_slice());
        }
        let report = c.report_episode(&[0.0; 8]).unwrap();
        assert_eq!(report.admitted, Some(8));
        assert_ne!(c.reset(8).unwrap(), first.as_slice());
    }

    #[test]
    fn resizing_a_reused_batch_fails() {
        let mut cfg = config(64);
        cfg.curriculum.eval_iter = 2;
        let mut c = controller(cfg);
        c.reset(8).unwrap();
        c.report_episode(&[1.0; 8]).unwrap();
        assert!(matches!(
            c.reset(4),
            Err(CurriculumError::BatchSizeChanged {
                expected: 8,
                actual: 4
            })
        ));
    }

    #[test]
    fn mastery_ratchets_to_uniform() {
        let mut c = controller(config(64));
        c.reset(10).unwrap();
        let report = c.report_episode(&[1.0; 10]).unwrap();
        assert!(report.ratcheted);
        assert_eq!(c.ratio_unif(), 1.0);
        c.reset(10).unwrap();
        assert_eq!(c.diagnostics().num_unif, 10);

        let again = c.report_episode(&[1.0; 10]).unwrap();
        assert!(!again.ratcheted);
    }

    #[test]
    fn threshold_itself_does_not_ratchet() {
        let mut c = controller(config(64));
        c.reset(10).unwrap();
        let mut success = [1.0; 10];
        success[0] = 0.0;
        let report = c.report_episode(&success).unwrap();
        assert!(!report.ratcheted);
        assert_eq!(c.ratio_unif(), 0.5);
    }

    #[test]
    fn only_windowed_tasks_are_admitted() {
        let mut cfg = config(64);
        cfg.curriculum.eviction = EvictionPolicy::Fifo;
        let mut c = controller(cfg);
        let batch = c.reset(6).unwrap().to_vec();
        let report = c.report_episode(&[0.0, 1.0, 0.5, 1.0, 0.25, 1.0]).unwrap();
        assert_eq!(report.admitted, Some(3));
        let history = c.buffer().history();
        assert_eq!(history.len(), 64);
        assert_eq!(&history[61..], &[batch[0].clone(), batch[2].clone(), batch[4].clone()]);
    }

    #[test]
    fn success_is_split_at_uniform_slots() {
        let mut c = controller(config(64));
        c.reset(8).unwrap();
        c.report_episode(&[1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        let d = c.diagnostics();
        assert_eq!(d.success_unif, Some(0.75));
        assert_eq!(d.success_buffer, Some(0.0));
    }

    #[test]
    fn obstacle_ratios_cover_the_batch() {
        let mut c = controller(config(64));
        c.reset(32).unwrap();
        c.report_episode(&[0.0; 32]).unwrap();
        let stats = c.diagnostics().obstacle_stats;
        assert_eq!(stats.len(), 6);
        let total: f64 = stats.iter().map(|s| s.ratio).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn report_after_flush_needs_a_reset() {
        let mut cfg = config(64);
        cfg.curriculum.eval_iter = 1;
        let mut c = controller(cfg);

        c.reset(4).unwrap();
        let first = c.report_episode(&[1.0, 1.0, 0.0, 0.0]).unwrap();
        assert!(first.admitted.is_some());
        let history = c.buffer().len();

        assert!(matches!(
            c.report_episode(&[1.0; 4]),
            Err(CurriculumError::NoActiveBatch)
        ));
        assert_eq!(c.ratio_unif(), 0.5);
        assert_eq!(c.buffer().len(), history);

        c.reset(4).unwrap();
        c.report_episode(&[0.0; 4]).unwrap();
        assert_eq!(c.buffer().weights(), &[0.0; 4]);
    }

    #[test]
    fn success_length_must_match_batch() {
        let mut c = controller(config(64));
        assert!(matches!(
            c.report_episode(&[1.0]),
            Err(CurriculumError::NoActiveBatch)
        ));
        c.reset(4).unwrap();
        assert!(matches!(
            c.report_episode(&[1.0; 3]),
            Err(CurriculumError::SuccessLengthMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn direct_sampling_replays_history() {
        let mut cfg = config(64);
        cfg.curriculum.perturb_buffer_tasks = false;
        let mut c = controller(cfg);
        let batch = c.reset(8).unwrap().to_vec();
        let history = c.buffer().history();
        assert!(batch[4..].iter().all(|t| history.contains(t)));
    }

    #[test]
    fn same_seed_same_batches() {
        let mut a = controller(config(64));
        let mut b = controller(config(64));
        assert_eq!(a.reset(12).unwrap(), b.reset(12).unwrap());
    }

    #[test]
    fn history_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let c = controller(config(32));
        let path = c.save_history(dir.path(), 3).unwrap();

        let mut cfg = config(32);
        cfg.curriculum.init_easy = false;
        let mut fresh = controller(cfg);
        assert_eq!(fresh.load_history(&path).unwrap(), 32);
        assert_eq!(fresh.buffer().history(), c.buffer().history());
    }
}
