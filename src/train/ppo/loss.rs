//! Loss computation functions for PPO
//!
//! This module contains the core loss terms used in a PPO update: the
//! clipped surrogate objective, the one-step TD value loss, and the entropy
//! bonus, plus their weighted combination.

use tch::{Kind, Tensor};

/// Compute the PPO clipped surrogate objective
///
/// Returns (surrogate, clip_fraction, approx_kl). The surrogate is the
/// quantity to *maximize*; the elementwise minimum is taken before the mean.
///
/// # Arguments
/// * `log_probs` - Log probabilities of actions under current policy
/// * `old_log_probs` - Log probabilities stored when the actions were chosen
/// * `advantages` - Normalized advantages
/// * `clip_ratio` - PPO clipping parameter (epsilon)
pub fn compute_policy_loss(
    log_probs: &Tensor,
    old_log_probs: &Tensor,
    advantages: &Tensor,
    clip_ratio: f64,
) -> (Tensor, f64, f64) {
    // Compute probability ratio
    let ratio = (log_probs - old_log_probs).exp();

    // Pessimistic bound of the unclipped and clipped objectives
    let clipped_ratio = ratio.clamp(1.0 - clip_ratio, 1.0 + clip_ratio);
    let surrogate_1 = advantages * &ratio;
    let surrogate_2 = advantages * clipped_ratio;
    let surrogate = surrogate_1.minimum(&surrogate_2).mean(Kind::Float);

    // Diagnostics only, no gradient
    let (clip_fraction, approx_kl) = tch::no_grad(|| {
        let clip_fraction = (&ratio - 1.0).abs().gt(clip_ratio).to_kind(Kind::Float).mean(Kind::Float);
        let approx_kl = (old_log_probs - log_probs).mean(Kind::Float);
        (f64::try_from(&clip_fraction).unwrap_or(0.0), f64::try_from(&approx_kl).unwrap_or(0.0))
    });

    (surrogate, clip_fraction, approx_kl)
}

/// One-step TD targets `reward + gamma * next_value`
pub fn compute_td_targets(rewards: &Tensor, next_values: &Tensor, gamma: f64) -> Tensor {
    rewards + next_values * gamma
}

/// Mean squared error between value predictions and targets
pub fn compute_value_loss(values: &Tensor, targets: &Tensor) -> Tensor {
    (values - targets).square().mean(Kind::Float)
}

/// Mean entropy over every element of the batch
pub fn compute_entropy_bonus(entropy: &Tensor) -> Tensor {
    entropy.mean(Kind::Float)
}

/// `-surrogate + c1 * value_loss - c2 * entropy`
///
/// The optimizer minimizes, so the surrogate and entropy enter negated.
pub fn compute_total_loss(surrogate: &Tensor, value_loss: &Tensor, entropy: &Tensor, c1: f64, c2: f64) -> Tensor {
    -surrogate + value_loss * c1 - entropy * c2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(values: &[f32]) -> Tensor {
        Tensor::from_slice(values)
    }

    fn scalar(t: &Tensor) -> f64 {
        f64::try_from(t).unwrap()
    }

    #[test]
    fn test_unit_ratio_gives_mean_advantage() {
        let log_probs = t(&[-1.0, -0.5, -2.0, -0.1]);
        let advantages = t(&[1.0, -2.0, 0.5, 3.0]);

        for clip in [0.05, 0.2, 0.9] {
            let (surrogate, clip_fraction, approx_kl) =
                compute_policy_loss(&log_probs, &log_probs, &advantages, clip);
            assert!((scalar(&surrogate) - 0.625).abs() < 1e-6);
            assert_eq!(clip_fraction, 0.0);
            assert_eq!(approx_kl, 0.0);
        }
    }

    #[test]
    fn test_positive_advantage_is_capped() {
        // ratio = 2, A = 1: min(2, 1.2) = 1.2
        let old = t(&[0.0]);
        let new = t(&[(2.0_f32).ln()]);
        let (surrogate, clip_fraction, _) = compute_policy_loss(&new, &old, &t(&[1.0]), 0.2);
        assert!((scalar(&surrogate) - 1.2).abs() < 1e-5);
        assert_eq!(clip_fraction, 1.0);
    }

    #[test]
    fn test_negative_advantage_takes_pessimistic_bound() {
        // ratio = 0.5, A = -1: min(-0.5, -0.8) = -0.8
        let old = t(&[0.0]);
        let new = t(&[(0.5_f32).ln()]);
        let (surrogate, _, _) = compute_policy_loss(&new, &old, &t(&[-1.0]), 0.2);
        assert!((scalar(&surrogate) + 0.8).abs() < 1e-5);

        // ratio = 2, A = -1: min(-2, -1.2) = -2, the unclipped term wins
        let new = t(&[(2.0_f32).ln()]);
        let (surrogate, _, _) = compute_policy_loss(&new, &old, &t(&[-1.0]), 0.2);
        assert!((scalar(&surrogate) + 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_min_before_mean() {
        // Per-element: min(1.5*1, 1.2*1) = 1.2 and min(1.5*-1, 1.2*-1) = -1.5
        // Mean of minima is -0.15; the min of means would be 0.0
        let old = t(&[0.0, 0.0]);
        let new = t(&[(1.5_f32).ln(), (1.5_f32).ln()]);
        let (surrogate, _, _) = compute_policy_loss(&new, &old, &t(&[1.0, -1.0]), 0.2);
        assert!((scalar(&surrogate) + 0.15).abs() < 1e-5);
    }

    #[test]
    fn test_td_targets_and_value_loss() {
        let rewards = t(&[1.0, 0.0]);
        let next_values = t(&[2.0, 4.0]);
        let targets = compute_td_targets(&rewards, &next_values, 0.5);
        let targets_vec: Vec<f32> = Vec::try_from(&targets).unwrap();
        assert_eq!(targets_vec, vec![2.0, 2.0]);

        let values = t(&[1.0, 4.0]);
        // ((1-2)² + (4-2)²) / 2 = 2.5
        assert!((scalar(&compute_value_loss(&values, &targets)) - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_total_loss_signs() {
        let total = compute_total_loss(&t(&[2.0]).mean(Kind::Float), &t(&[3.0]).mean(Kind::Float), &t(&[1.5]).mean(Kind::Float), 0.5, 0.1);
        // -2 + 0.5*3 - 0.1*1.5 = -0.65
        assert!((scalar(&total) + 0.65).abs() < 1e-6);
    }

    #[test]
    fn test_entropy_bonus_is_mean() {
        let entropy = Tensor::from_slice(&[1.0_f32, 2.0, 3.0, 4.0]).view([2, 2]);
        assert!((scalar(&compute_entropy_bonus(&entropy)) - 2.5).abs() < 1e-6);
    }
}
