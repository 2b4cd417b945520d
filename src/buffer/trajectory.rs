//! Single-episode trajectory storage and minibatch sampling
//!
//! A [`Trajectory`] is filled step by step during a rollout and read back
//! once the episode is over. Minibatches are drawn uniformly **with
//! replacement**, so a batch may be larger than the episode.

use anyhow::{Result, bail};
use rand::Rng;

/// One timestep of experience
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Observation the action was chosen from
    pub observation: Vec<f32>,

    /// Action in the environment's native range
    pub action: Vec<f32>,

    /// Log probability of the (normalized, clipped) action when it was chosen
    pub log_prob: f32,

    /// Reward received
    pub reward: f32,

    /// Value estimate of `observation` when the action was chosen
    pub value: f32,
}

/// Ordered, append-only record of one episode
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    transitions: Vec<Transition>,
}

impl Trajectory {
    /// Create an empty trajectory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty trajectory with room for `capacity` steps
    pub fn with_capacity(capacity: usize) -> Self {
        Self { transitions: Vec::with_capacity(capacity) }
    }

    /// Append a transition
    pub fn push(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    /// Number of stored timesteps
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Check if trajectory is empty
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Stored transitions in time order
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Rewards in time order
    pub fn rewards(&self) -> Vec<f32> {
        self.transitions.iter().map(|t| t.reward).collect()
    }

    /// Value predictions in time order
    pub fn values(&self) -> Vec<f32> {
        self.transitions.iter().map(|t| t.value).collect()
    }

    /// Successor-state value per timestep
    ///
    /// `next_values[t] = values[t + 1]`, with a bootstrap of 0 for the last
    /// step.
    pub fn next_values(&self) -> Vec<f32> {
        self.transitions.iter().skip(1).map(|t| t.value).chain(std::iter::once(0.0)).take(self.len()).collect()
    }

    /// Undiscounted sum of rewards
    pub fn total_reward(&self) -> f64 {
        self.transitions.iter().map(|t| t.reward as f64).sum()
    }

    /// Gather a minibatch at `indices`
    ///
    /// `next_values` and `advantages` must be parallel to the trajectory.
    pub fn gather(&self, indices: &[usize], next_values: &[f32], advantages: &[f32]) -> Result<Minibatch> {
        if next_values.len() != self.len() || advantages.len() != self.len() {
            bail!(
                "Parallel arrays must match trajectory length {} (next_values={}, advantages={})",
                self.len(),
                next_values.len(),
                advantages.len()
            );
        }
        let (obs_dim, action_dim) = match self.transitions.first() {
            Some(first) => (first.observation.len(), first.action.len()),
            None => bail!("Cannot sample from an empty trajectory"),
        };

        let batch_size = indices.len();
        let mut batch = Minibatch {
            observations: Vec::with_capacity(batch_size * obs_dim),
            actions: Vec::with_capacity(batch_size * action_dim),
            log_probs: Vec::with_capacity(batch_size),
            next_values: Vec::with_capacity(batch_size),
            rewards: Vec::with_capacity(batch_size),
            advantages: Vec::with_capacity(batch_size),
            obs_dim,
            action_dim,
        };

        for &idx in indices {
            let Some(t) = self.transitions.get(idx) else {
                bail!("Sample index {} out of range for trajectory of length {}", idx, self.len());
            };
            batch.observations.extend_from_slice(&t.observation);
            batch.actions.extend_from_slice(&t.action);
            batch.log_probs.push(t.log_prob);
            batch.next_values.push(next_values[idx]);
            batch.rewards.push(t.reward);
            batch.advantages.push(advantages[idx]);
        }

        Ok(batch)
    }
}

/// Draw `batch_size` indices uniformly from `0..len`, with replacement
pub fn sample_indices<R: Rng + ?Sized>(len: usize, batch_size: usize, rng: &mut R) -> Vec<usize> {
    (0..batch_size).map(|_| rng.gen_range(0..len)).collect()
}

/// Minibatch data for one learner update
///
/// The six arrays are parallel; observations and actions are flattened
/// row-major.
#[derive(Debug, Clone)]
pub struct Minibatch {
    /// Observations [batch_size * obs_dim]
    pub observations: Vec<f32>,

    /// Native-range actions [batch_size * action_dim]
    pub actions: Vec<f32>,

    /// Log probabilities stored at collection time [batch_size]
    pub log_probs: Vec<f32>,

    /// Successor value predictions [batch_size]
    pub next_values: Vec<f32>,

    /// Rewards [batch_size]
    pub rewards: Vec<f32>,

    /// Normalized advantages [batch_size]
    pub advantages: Vec<f32>,

    obs_dim: usize,
    action_dim: usize,
}

impl Minibatch {
    /// Get batch size
    pub fn size(&self) -> usize {
        self.rewards.len()
    }

    /// Check if batch is empty
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Observation dimension
    pub fn obs_dim(&self) -> usize {
        self.obs_dim
    }

    /// Action dimension
    pub fn action_dim(&self) -> usize {
        self.action_dim
    }
}
