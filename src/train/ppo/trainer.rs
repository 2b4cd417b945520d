//! PPO Trainer implementation
//!
//! This module contains the episode loop that drives an environment with a
//! [`PPOAgent`], turns each episode into advantages and runs the learner
//! updates, emitting metrics and checkpoints along the way.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use rand::{SeedableRng, rngs::StdRng};

use super::{
    agent::PPOAgent,
    config::TrainConfig,
    stats::{EpisodeStats, TrainingStats},
};
use crate::{
    buffer::{Trajectory, Transition, gae::compute_gaes, sample_indices},
    env::{EnvSpec, Environment},
    utils::{
        metrics::{self, MetricsSink},
        normalize::normalize_in_place,
        video::FrameSink,
    },
};

/// Outcome of a training run
#[derive(Debug, Clone, Default)]
pub struct TrainingSummary {
    /// Episodes collected
    pub episodes: usize,

    /// Learner updates performed
    pub epochs: usize,

    /// Every checkpoint written, in order; the last one is the final save
    pub checkpoints: Vec<PathBuf>,

    /// Statistics of the last completed episode
    pub last_episode: Option<EpisodeStats>,
}

/// PPO Trainer driving the collect/update loop
///
/// Owns the training-loop parameters, the minibatch sampler and the episode
/// and epoch counters. The agent and environment are borrowed per call.
#[derive(Debug)]
pub struct PPOTrainer {
    config: TrainConfig,
    rng: StdRng,
    episode: usize,
    epoch: usize,
}

impl PPOTrainer {
    /// Create a new PPO trainer
    ///
    /// When `config.seed` is set, both the minibatch sampler and libtorch's
    /// global generator are seeded from it.
    pub fn new(config: TrainConfig) -> Result<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => {
                tch::manual_seed(seed as i64);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };

        Ok(Self { config, rng, episode: 0, epoch: 0 })
    }

    /// Get the configuration
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Episodes completed so far
    pub fn episode(&self) -> usize {
        self.episode
    }

    /// Learner updates completed so far
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Run one episode with the current policy and record it
    ///
    /// Stops when the environment reports `done` or after `max_steps` steps.
    /// Returns the trajectory and whether the step limit was hit.
    pub fn collect_episode<E: Environment + ?Sized>(
        &self,
        agent: &PPOAgent,
        env: &mut E,
    ) -> Result<(Trajectory, bool)> {
        let mut trajectory = Trajectory::with_capacity(self.config.max_steps);
        let mut state = env.reset()?;

        loop {
            let out = agent.act(&state, false)?;
            let step = env.step(&out.action)?;
            let done = step.done();

            trajectory.push(Transition {
                observation: state,
                action: out.action,
                log_prob: out.log_prob,
                reward: step.reward,
                value: out.value,
            });
            state = step.observation;

            let reached_max_steps = trajectory.len() >= self.config.max_steps;
            if done || reached_max_steps {
                return Ok((trajectory, reached_max_steps));
            }
        }
    }

    /// Run `n_updates` learner updates on one collected episode
    ///
    /// Advantages are computed and normalized over the whole episode, then
    /// each update draws `batch_size` indices with replacement. Loss scalars
    /// are emitted at step `epoch` before it is incremented.
    pub fn update<M: MetricsSink + ?Sized>(
        &mut self,
        agent: &mut PPOAgent,
        trajectory: &Trajectory,
        sink: &mut M,
    ) -> Result<TrainingStats> {
        if trajectory.is_empty() {
            bail!("Cannot update from an empty trajectory");
        }

        let config = agent.config().clone();
        let next_values = trajectory.next_values();
        let mut advantages = compute_gaes(
            &trajectory.rewards(),
            &trajectory.values(),
            &next_values,
            config.gamma as f32,
            config.lam as f32,
        )?;
        normalize_in_place(&mut advantages)
            .with_context(|| format!("Episode {} produced degenerate advantages", self.episode + 1))?;

        let mut stats_sum = TrainingStats::zeros();
        for _ in 0..config.n_updates {
            let indices = sample_indices(trajectory.len(), config.batch_size, &mut self.rng);
            let batch = trajectory.gather(&indices, &next_values, &advantages)?;

            let stats = agent
                .learn(&batch)
                .with_context(|| format!("Learner update failed at epoch {}", self.epoch))?;

            sink.add_scalar(metrics::TOTAL_LOSS, stats.total_loss, self.epoch)?;
            sink.add_scalar(metrics::CLIPPED_SURR, stats.surrogate, self.epoch)?;
            sink.add_scalar(metrics::VF_LOSS, stats.value_loss, self.epoch)?;
            sink.add_scalar(metrics::ENTROPY, stats.entropy, self.epoch)?;
            sink.flush()?;

            tracing::debug!(
                "epoch {}: loss={:.4} surr={:.4} vf={:.4} ent={:.4} clip={:.3} kl={:.5}",
                self.epoch,
                stats.total_loss,
                stats.surrogate,
                stats.value_loss,
                stats.entropy,
                stats.clip_fraction,
                stats.approx_kl
            );

            stats_sum += &stats;
            self.epoch += 1;
        }

        Ok(stats_sum.average())
    }

    /// Collect one episode, learn from it and record episode metrics
    pub fn train_episode<E, M>(&mut self, agent: &mut PPOAgent, env: &mut E, sink: &mut M) -> Result<EpisodeStats>
    where
        E: Environment + ?Sized,
        M: MetricsSink + ?Sized,
    {
        let (trajectory, reached_max_steps) = self.collect_episode(agent, env)?;
        let losses = self.update(agent, &trajectory, sink)?;

        self.episode += 1;
        let stats = EpisodeStats {
            episode: self.episode,
            reward: trajectory.total_reward(),
            steps: trajectory.len(),
            epoch: self.epoch,
            reached_max_steps,
            losses,
        };

        sink.add_scalar(metrics::EPISODE_REWARD, stats.reward, stats.episode)?;
        sink.add_scalar(metrics::EPISODE_STEPS, stats.steps as f64, stats.episode)?;
        sink.flush()?;

        tracing::info!(
            "episode {}: {:.2} total reward, {} steps, {} epochs",
            stats.episode,
            stats.reward,
            stats.steps,
            stats.epoch
        );
        if reached_max_steps {
            tracing::info!("episode {}: reached max steps ({})", stats.episode, self.config.max_steps);
        }

        Ok(stats)
    }

    /// Train until `max_epochs` learner updates have run
    ///
    /// Checkpoints `ppo_episode{N}` whenever an episode hits the step limit
    /// or `N` is a multiple of `save_freq`, and always writes
    /// `ppo_final_episode{N}` at the end.
    pub fn train<E, M>(&mut self, agent: &mut PPOAgent, env: &mut E, sink: &mut M) -> Result<TrainingSummary>
    where
        E: Environment + ?Sized,
        M: MetricsSink + ?Sized,
    {
        let env_spec = EnvSpec::from_env(&*env)?;
        if &env_spec != agent.spec() {
            bail!("Environment spec {:?} does not match the agent's {:?}", env_spec, agent.spec());
        }

        let checkpoint_dir = self.config.checkpoint_dir.clone();
        fs::create_dir_all(&checkpoint_dir)
            .with_context(|| format!("Failed to create checkpoint directory {}", checkpoint_dir.display()))?;

        tracing::info!(
            "Starting PPO training: max_epochs={}, max_steps={}, save_freq={}, checkpoints in {}",
            self.config.max_epochs,
            self.config.max_steps,
            self.config.save_freq,
            checkpoint_dir.display()
        );

        let mut summary = TrainingSummary::default();
        while self.epoch < self.config.max_epochs {
            let stats = self.train_episode(agent, env, sink)?;

            if stats.reached_max_steps || stats.episode % self.config.save_freq == 0 {
                let path = checkpoint_path(&checkpoint_dir, "ppo_episode", stats.episode);
                save_checkpoint(agent, &path)?;
                summary.checkpoints.push(path);
            }

            summary.last_episode = Some(stats);
        }

        let path = checkpoint_path(&checkpoint_dir, "ppo_final_episode", self.episode);
        save_checkpoint(agent, &path)?;
        summary.checkpoints.push(path);

        summary.episodes = self.episode;
        summary.epochs = self.epoch;

        tracing::info!("Training finished after {} episodes, {} epochs", summary.episodes, summary.epochs);

        Ok(summary)
    }

    /// Run one deterministic episode and return its total reward
    ///
    /// When a frame sink is given, a rendered frame is appended after every
    /// step and the sink is closed at the end. The agent is not modified.
    pub fn evaluate<E: Environment + ?Sized>(
        &self,
        agent: &PPOAgent,
        env: &mut E,
        mut frames: Option<&mut dyn FrameSink>,
    ) -> Result<f64> {
        let mut state = env.reset()?;
        let mut total_reward = 0.0;
        let mut steps = 0;

        loop {
            let out = agent.act(&state, true)?;
            let step = env.step(&out.action)?;
            total_reward += step.reward as f64;
            steps += 1;

            if let Some(sink) = frames.as_deref_mut() {
                if let Some(frame) = env.render()? {
                    sink.append(&frame)?;
                }
            }

            if step.done() || steps >= self.config.max_steps {
                break;
            }
            state = step.observation;
        }

        if let Some(sink) = frames {
            sink.close()?;
        }

        tracing::info!("evaluation: {:.2} total reward, {} steps", total_reward, steps);
        Ok(total_reward)
    }
}

fn checkpoint_path(dir: &Path, prefix: &str, episode: usize) -> PathBuf {
    dir.join(format!("{}{}.safetensors", prefix, episode))
}

fn save_checkpoint(agent: &PPOAgent, path: &Path) -> Result<()> {
    agent.save(path).with_context(|| format!("Failed to save checkpoint {}", path.display()))?;
    tracing::info!("Saved checkpoint {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        env::{SpaceInfo, StepResult},
        train::ppo::PPOConfig,
        utils::metrics::MemorySink,
    };

    /// Moves toward a target; reward is minus the distance after the move
    struct LineWorld {
        position: f32,
        steps: usize,
        horizon: usize,
    }

    impl LineWorld {
        fn new(horizon: usize) -> Self {
            Self { position: 0.0, steps: 0, horizon }
        }
    }

    impl Environment for LineWorld {
        fn reset(&mut self) -> Result<Vec<f32>> {
            self.position = 0.0;
            self.steps = 0;
            Ok(vec![self.position, 1.0])
        }

        fn step(&mut self, action: &[f32]) -> Result<StepResult> {
            self.position += action[0];
            self.steps += 1;
            Ok(StepResult {
                observation: vec![self.position, 1.0],
                reward: -(self.position - 3.0).abs() - self.steps as f32,
                terminated: self.steps >= self.horizon,
                truncated: false,
            })
        }

        fn observation_space(&self) -> SpaceInfo {
            SpaceInfo::unbounded(2)
        }

        fn action_space(&self) -> SpaceInfo {
            SpaceInfo::bounded(vec![-1.0], vec![1.0])
        }
    }

    fn setup(horizon: usize, train: TrainConfig) -> (PPOAgent, LineWorld, PPOTrainer) {
        let env = LineWorld::new(horizon);
        let agent = PPOAgent::from_env(&env, PPOConfig::new().batch_size(8).n_updates(2)).unwrap();
        let trainer = PPOTrainer::new(train.seed(7)).unwrap();
        (agent, env, trainer)
    }

    #[test]
    fn test_collect_episode_stops_on_done() {
        let (agent, mut env, trainer) = setup(3, TrainConfig::new().max_steps(10));
        let (trajectory, reached_max) = trainer.collect_episode(&agent, &mut env).unwrap();

        assert_eq!(trajectory.len(), 3);
        assert!(!reached_max);
    }

    #[test]
    fn test_collect_episode_stops_at_max_steps() {
        let (agent, mut env, trainer) = setup(50, TrainConfig::new().max_steps(6));
        let (trajectory, reached_max) = trainer.collect_episode(&agent, &mut env).unwrap();

        assert_eq!(trajectory.len(), 6);
        assert!(reached_max);
    }

    #[test]
    fn test_train_episode_counts_and_metrics() {
        let (mut agent, mut env, mut trainer) = setup(4, TrainConfig::new().max_steps(10));
        let mut sink = MemorySink::new();

        let stats = trainer.train_episode(&mut agent, &mut env, &mut sink).unwrap();
        assert_eq!(stats.episode, 1);
        assert_eq!(stats.steps, 4);
        assert_eq!(stats.epoch, 2);
        assert_eq!(stats.losses.num_updates, 2);

        assert_eq!(sink.series(metrics::TOTAL_LOSS).iter().map(|(s, _)| *s).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(sink.series(metrics::EPISODE_STEPS), vec![(1, 4.0)]);
        assert_eq!(sink.series(metrics::EPISODE_REWARD).len(), 1);
    }

    #[test]
    fn test_train_checkpoints_on_max_steps_and_save_freq() {
        let dir = tempfile::tempdir().unwrap();
        let train = TrainConfig::new().max_epochs(6).max_steps(5).save_freq(2).checkpoint_dir(dir.path());
        let (mut agent, mut env, mut trainer) = setup(50, train);
        let mut sink = MemorySink::new();

        let summary = trainer.train(&mut agent, &mut env, &mut sink).unwrap();

        // 2 updates per episode, 6 epochs => 3 episodes, each hitting max_steps
        assert_eq!(summary.episodes, 3);
        assert_eq!(summary.epochs, 6);
        let names: Vec<String> = summary
            .checkpoints
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "ppo_episode1.safetensors",
                "ppo_episode2.safetensors",
                "ppo_episode3.safetensors",
                "ppo_final_episode3.safetensors",
            ]
        );
        assert!(summary.checkpoints.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_train_checkpoints_on_save_freq_alone() {
        let dir = tempfile::tempdir().unwrap();
        let train = TrainConfig::new().max_epochs(6).max_steps(10).save_freq(2).checkpoint_dir(dir.path());
        let (mut agent, mut env, mut trainer) = setup(3, train);

        let summary = trainer.train(&mut agent, &mut env, &mut MemorySink::new()).unwrap();

        // Episodes end after 3 steps, well short of max_steps
        assert_eq!(summary.episodes, 3);
        assert!(!summary.last_episode.as_ref().unwrap().reached_max_steps);
        let names: Vec<String> = summary
            .checkpoints
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["ppo_episode2.safetensors", "ppo_final_episode3.safetensors"]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_train_rejects_mismatched_env() {
        let (mut agent, _, mut trainer) = setup(3, TrainConfig::new());

        struct Wide;
        impl Environment for Wide {
            fn reset(&mut self) -> Result<Vec<f32>> {
                Ok(vec![0.0; 2])
            }
            fn step(&mut self, _action: &[f32]) -> Result<StepResult> {
                bail!("unused")
            }
            fn observation_space(&self) -> SpaceInfo {
                SpaceInfo::unbounded(2)
            }
            fn action_space(&self) -> SpaceInfo {
                SpaceInfo::bounded(vec![-1.0, -1.0], vec![1.0, 1.0])
            }
        }

        assert!(trainer.train(&mut agent, &mut Wide, &mut MemorySink::new()).is_err());
    }

    #[test]
    fn test_single_step_episode_is_degenerate() {
        let (mut agent, mut env, mut trainer) = setup(1, TrainConfig::new());
        let err = trainer.train_episode(&mut agent, &mut env, &mut MemorySink::new()).unwrap_err();
        assert!(format!("{:#}", err).contains("degenerate advantages"));
    }
}
