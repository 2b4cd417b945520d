//! Training statistics for PPO
//!
//! This module defines structures for tracking and aggregating
//! training metrics during PPO training.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

/// Training statistics for a PPO update
///
/// Tracks the four logged loss terms of a single learner step plus a couple
/// of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    /// Total loss (-surrogate + c1 * value_loss - c2 * entropy)
    pub total_loss: f64,

    /// Clipped surrogate objective (maximized)
    pub surrogate: f64,

    /// Value function loss
    pub value_loss: f64,

    /// Mean policy entropy
    pub entropy: f64,

    /// Fraction of samples whose ratio fell outside the clip range
    pub clip_fraction: f64,

    /// Approximate KL divergence between collection and current policies
    pub approx_kl: f64,

    /// Number of gradient updates performed
    pub num_updates: usize,
}

impl TrainingStats {
    /// Create zero-initialized statistics
    pub fn zeros() -> Self {
        Self::default()
    }

    /// Create statistics for one update
    pub fn new(
        total_loss: f64,
        surrogate: f64,
        value_loss: f64,
        entropy: f64,
        clip_fraction: f64,
        approx_kl: f64,
    ) -> Self {
        Self { total_loss, surrogate, value_loss, entropy, clip_fraction, approx_kl, num_updates: 1 }
    }

    /// Add another statistics instance to this one
    pub fn add(&mut self, other: &TrainingStats) {
        self.total_loss += other.total_loss;
        self.surrogate += other.surrogate;
        self.value_loss += other.value_loss;
        self.entropy += other.entropy;
        self.clip_fraction += other.clip_fraction;
        self.approx_kl += other.approx_kl;
        self.num_updates += other.num_updates;
    }

    /// Compute average statistics across multiple updates
    ///
    /// Loss terms are averaged; `num_updates` keeps the number of updates
    /// that went into the average.
    pub fn average(&self) -> Self {
        let scale = self.num_updates as f64;
        if scale == 0.0 {
            return Self::zeros();
        }

        Self {
            total_loss: self.total_loss / scale,
            surrogate: self.surrogate / scale,
            value_loss: self.value_loss / scale,
            entropy: self.entropy / scale,
            clip_fraction: self.clip_fraction / scale,
            approx_kl: self.approx_kl / scale,
            num_updates: self.num_updates,
        }
    }
}

impl AddAssign<&TrainingStats> for TrainingStats {
    fn add_assign(&mut self, other: &TrainingStats) {
        self.add(other);
    }
}

/// Summary of one collected episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    /// 1-based episode index
    pub episode: usize,

    /// Undiscounted episode return
    pub reward: f64,

    /// Environment steps taken
    pub steps: usize,

    /// Learner updates completed so far (after this episode)
    pub epoch: usize,

    /// Whether the episode hit the step limit
    pub reached_max_steps: bool,

    /// Averaged learner statistics for this episode's updates
    pub losses: TrainingStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average() {
        let mut sum = TrainingStats::zeros();
        sum += &TrainingStats::new(1.0, 2.0, 3.0, 4.0, 0.5, 0.1);
        sum += &TrainingStats::new(3.0, 0.0, 1.0, 2.0, 0.0, 0.3);

        let avg = sum.average();
        assert_eq!(avg.num_updates, 2);
        assert_eq!(avg.total_loss, 2.0);
        assert_eq!(avg.surrogate, 1.0);
        assert_eq!(avg.value_loss, 2.0);
        assert_eq!(avg.entropy, 3.0);
        assert_eq!(avg.clip_fraction, 0.25);
        assert!((avg.approx_kl - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_average_of_nothing() {
        assert_eq!(TrainingStats::zeros().average(), TrainingStats::zeros());
    }
}
