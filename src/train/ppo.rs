//! Proximal Policy Optimization (PPO) for continuous actions
//!
//! This module implements the PPO algorithm for a diagonal-Gaussian policy.
//! PPO is a policy gradient method that uses a clipped surrogate objective
//! to keep each update close to the policy that collected the data.
//!
//! # Algorithm Overview
//!
//! ```text
//! While epoch < max_epochs:
//!   1. Collect one episode with the current policy
//!   2. Compute advantages using GAE and normalize them over the episode
//!   3. Repeat n_updates times:
//!      a. Sample a minibatch with replacement
//!      b. Compute PPO loss (clipped surrogate + value loss - entropy bonus)
//!      c. Take one Adam step on the network weights and log_std
//! ```
//!
//! # References
//!
//! - [Proximal Policy Optimization Algorithms](https://arxiv.org/abs/1707.06347)
//! - [High-Dimensional Continuous Control Using GAE](https://arxiv.org/abs/1506.02438)

mod agent;
mod config;
mod loss;
mod stats;
mod trainer;

pub use agent::{ActOutput, PPOAgent};
pub use config::{PPOConfig, RunConfig, TrainConfig};
pub use loss::{
    compute_entropy_bonus, compute_policy_loss, compute_td_targets, compute_total_loss, compute_value_loss,
};
pub use stats::{EpisodeStats, TrainingStats};
pub use trainer::{PPOTrainer, TrainingSummary};
