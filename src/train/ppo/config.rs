//! PPO configuration and hyperparameters
//!
//! This module defines the configuration parameters for the agent and the
//! training loop, with validation and builder pattern methods. Both are
//! serde-serializable so a run can be described by a single JSON file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// PPO agent hyperparameters
///
/// Immutable for the lifetime of an agent. Defaults reproduce the settings
/// the algorithm was originally tuned with for small continuous-control
/// tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PPOConfig {
    /// Adam learning rate for the network and `log_std`
    pub learning_rate: f64,

    /// Hidden layer sizes of both the policy and value towers
    pub hidden_units: Vec<i64>,

    /// Value loss coefficient (c1)
    pub c1: f64,

    /// Entropy bonus coefficient (c2)
    pub c2: f64,

    /// PPO clipping parameter (epsilon)
    pub clip_ratio: f64,

    /// Discount factor (gamma)
    pub gamma: f64,

    /// GAE decay (lambda)
    pub lam: f64,

    /// Minibatch size, sampled with replacement from each episode
    pub batch_size: usize,

    /// Learner updates per collected episode
    pub n_updates: usize,
}

impl Default for PPOConfig {
    fn default() -> Self {
        Self {
            learning_rate: 5e-4,
            hidden_units: vec![24, 16],
            c1: 1.0,
            c2: 0.01,
            clip_ratio: 0.2,
            gamma: 0.95,
            lam: 1.0,
            batch_size: 64,
            n_updates: 4,
        }
    }
}

impl PPOConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0) {
            return Err(anyhow!("learning_rate must be positive"));
        }
        if self.hidden_units.is_empty() || self.hidden_units.iter().any(|&u| u <= 0) {
            return Err(anyhow!("hidden_units must be a non-empty list of positive sizes"));
        }
        if !(self.c1 >= 0.0) {
            return Err(anyhow!("c1 must be non-negative"));
        }
        if !(self.c2 >= 0.0) {
            return Err(anyhow!("c2 must be non-negative"));
        }
        if !(self.clip_ratio > 0.0 && self.clip_ratio < 1.0) {
            return Err(anyhow!("clip_ratio must be in (0, 1)"));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(anyhow!("gamma must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.lam) {
            return Err(anyhow!("lam must be in [0, 1]"));
        }
        if self.batch_size == 0 {
            return Err(anyhow!("batch_size must be positive"));
        }
        if self.n_updates == 0 {
            return Err(anyhow!("n_updates must be positive"));
        }
        Ok(())
    }

    /// Set learning rate
    pub fn learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Set hidden layer sizes
    pub fn hidden_units(mut self, units: impl Into<Vec<i64>>) -> Self {
        self.hidden_units = units.into();
        self
    }

    /// Set value loss coefficient
    pub fn c1(mut self, coef: f64) -> Self {
        self.c1 = coef;
        self
    }

    /// Set entropy bonus coefficient
    pub fn c2(mut self, coef: f64) -> Self {
        self.c2 = coef;
        self
    }

    /// Set PPO clipping parameter
    pub fn clip_ratio(mut self, clip: f64) -> Self {
        self.clip_ratio = clip;
        self
    }

    /// Set discount factor
    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Set GAE lambda
    pub fn lam(mut self, lam: f64) -> Self {
        self.lam = lam;
        self
    }

    /// Set minibatch size
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set number of learner updates per episode
    pub fn n_updates(mut self, n: usize) -> Self {
        self.n_updates = n;
        self
    }
}

/// Training loop parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Stop once this many learner updates have run
    pub max_epochs: usize,

    /// Episode step limit; reaching it also triggers a checkpoint
    pub max_steps: usize,

    /// Checkpoint every `save_freq` episodes
    pub save_freq: usize,

    /// Directory checkpoints are written to
    pub checkpoint_dir: PathBuf,

    /// Seed for minibatch sampling and libtorch's generator
    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            max_epochs: 8000,
            max_steps: 500,
            save_freq: 50,
            checkpoint_dir: PathBuf::from("."),
            seed: None,
        }
    }
}

impl TrainConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.max_epochs == 0 {
            return Err(anyhow!("max_epochs must be positive"));
        }
        if self.max_steps == 0 {
            return Err(anyhow!("max_steps must be positive"));
        }
        if self.save_freq == 0 {
            return Err(anyhow!("save_freq must be positive"));
        }
        Ok(())
    }

    /// Set the learner-update budget
    pub fn max_epochs(mut self, epochs: usize) -> Self {
        self.max_epochs = epochs;
        self
    }

    /// Set the episode step limit
    pub fn max_steps(mut self, steps: usize) -> Self {
        self.max_steps = steps;
        self
    }

    /// Set the checkpoint period in episodes
    pub fn save_freq(mut self, freq: usize) -> Self {
        self.save_freq = freq;
        self
    }

    /// Set the checkpoint directory
    pub fn checkpoint_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = dir.into();
        self
    }

    /// Seed the run
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Complete description of a training run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Agent hyperparameters
    pub ppo: PPOConfig,
    /// Training loop parameters
    pub train: TrainConfig,
}

impl RunConfig {
    /// Validate both halves
    pub fn validate(&self) -> Result<()> {
        self.ppo.validate()?;
        self.train.validate()
    }

    /// Save to a pretty-printed JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read run config {}", path.display()))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse run config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PPOConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.learning_rate, 5e-4);
        assert_eq!(config.hidden_units, vec![24, 16]);
        assert_eq!(config.n_updates, 4);
        assert_eq!(config.batch_size, 64);

        let train = TrainConfig::default();
        assert!(train.validate().is_ok());
        assert_eq!((train.max_epochs, train.max_steps, train.save_freq), (8000, 500, 50));
    }

    #[test]
    fn test_config_validation() {
        // Valid config should pass
        let config = PPOConfig::new();
        assert!(config.validate().is_ok());

        // Invalid learning rate
        assert!(PPOConfig::new().learning_rate(-1.0).validate().is_err());
        assert!(PPOConfig::new().learning_rate(f64::NAN).validate().is_err());

        // Invalid gamma / lam
        assert!(PPOConfig::new().gamma(1.5).validate().is_err());
        assert!(PPOConfig::new().lam(-0.1).validate().is_err());

        // Invalid clip ratio
        assert!(PPOConfig::new().clip_ratio(0.0).validate().is_err());
        assert!(PPOConfig::new().clip_ratio(1.0).validate().is_err());

        // Invalid sizes
        assert!(PPOConfig::new().batch_size(0).validate().is_err());
        assert!(PPOConfig::new().n_updates(0).validate().is_err());
        assert!(PPOConfig::new().hidden_units(Vec::<i64>::new()).validate().is_err());
        assert!(PPOConfig::new().hidden_units([16, -1]).validate().is_err());

        // Coefficients may be zero but not negative
        assert!(PPOConfig::new().c1(-0.1).validate().is_err());
        assert!(PPOConfig::new().c2(0.0).validate().is_ok());

        assert!(TrainConfig::new().save_freq(0).validate().is_err());
        assert!(TrainConfig::new().max_epochs(0).validate().is_err());
        assert!(TrainConfig::new().max_steps(0).validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = PPOConfig::new().learning_rate(1e-3).batch_size(128).gamma(0.99).clip_ratio(0.1);

        assert_eq!(config.learning_rate, 1e-3);
        assert_eq!(config.batch_size, 128);
        assert_eq!(config.gamma, 0.99);
        assert_eq!(config.clip_ratio, 0.1);

        // Other values should remain default
        assert_eq!(config.lam, 1.0);
        assert_eq!(config.c1, 1.0);
    }

    #[test]
    fn test_run_config_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");

        let config = RunConfig {
            ppo: PPOConfig::new().n_updates(8),
            train: TrainConfig::new().max_steps(200).seed(3).checkpoint_dir("ckpt"),
        };
        config.save_json(&path).unwrap();

        let loaded = RunConfig::load_json(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_run_config_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "ppo": { "gamma": 0.99 }, "train": { "save_freq": 10 } }"#).unwrap();

        let loaded = RunConfig::load_json(&path).unwrap();
        assert_eq!(loaded.ppo.gamma, 0.99);
        assert_eq!(loaded.ppo.clip_ratio, 0.2);
        assert_eq!(loaded.train.save_freq, 10);
        assert_eq!(loaded.train.max_steps, 500);
    }

    #[test]
    fn test_run_config_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "ppo": { "batch_size": 0 } }"#).unwrap();

        assert!(RunConfig::load_json(&path).is_err());
    }
}
