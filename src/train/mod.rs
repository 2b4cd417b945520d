//! Training algorithms
//!
//! This module implements the PPO agent and its training loop.

pub mod ppo;

pub use ppo::{
    ActOutput, EpisodeStats, PPOAgent, PPOConfig, PPOTrainer, RunConfig, TrainConfig, TrainingStats,
    TrainingSummary,
};
