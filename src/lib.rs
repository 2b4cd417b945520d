//! # ppo-continuous
//!
//! Proximal Policy Optimization for continuous-control agents in Rust + tch-rs
//!
//! A single-process PPO implementation: a tanh actor-critic with a learned,
//! state-independent `log_std`, GAE advantages normalized per episode, and
//! minibatches sampled with replacement from each collected episode.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ppo_continuous::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut env = Pendulum::new(200);
//! let mut agent = PPOAgent::from_env(&env, PPOConfig::default())?;
//! let mut trainer = PPOTrainer::new(TrainConfig::new().max_epochs(400).max_steps(200))?;
//!
//! let mut metrics = MemorySink::new();
//! let summary = trainer.train(&mut agent, &mut env, &mut metrics)?;
//! println!("trained for {} episodes", summary.episodes);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Environment traits and implementations
pub mod env;

/// Policy network and action distribution
pub mod policy;

/// Trajectory storage and advantage estimation
pub mod buffer;

/// Training algorithms (PPO)
pub mod train;

/// Utility functions and helpers
pub mod utils;

/// Prelude module for convenient imports
///
/// This module re-exports commonly used types and traits for convenience.
pub mod prelude {
    pub use crate::{
        env::{EnvSpec, Environment, Frame, SpaceInfo, SpaceType, StepResult, pendulum::Pendulum},
        policy::{DiagGaussian, GaussianMlpPolicy, MlpConfig},
        train::{
            ActOutput, EpisodeStats, PPOAgent, PPOConfig, PPOTrainer, RunConfig, TrainConfig, TrainingStats,
            TrainingSummary,
        },
        utils::{
            metrics::{JsonlSink, MemorySink, MetricsSink, TensorboardSink},
            video::{FrameRecorder, FrameSink},
        },
    };
}

/// Current version of ppo-continuous
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
