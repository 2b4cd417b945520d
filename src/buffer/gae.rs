//! Generalized Advantage Estimation (GAE) computation
//!
//! Advantages are computed per episode from rewards and the value predictions
//! recorded during the rollout.

use anyhow::{Result, bail};

/// Compute Generalized Advantage Estimation (GAE)
///
/// # Arguments
/// * `rewards` - Reward per timestep
/// * `values` - Value prediction per timestep
/// * `next_values` - Successor value per timestep (0 after the final step)
/// * `gamma` - Discount factor
/// * `lam` - GAE decay
///
/// # Mathematical Formula
/// ```text
/// δ_t     = r_t + γ * V_{t+1} - V_t
/// A_{T-1} = δ_{T-1}
/// A_t     = δ_t + γ * λ * A_{t+1}
/// ```
///
/// The recursion runs strictly backwards in time.
pub fn compute_gaes(
    rewards: &[f32],
    values: &[f32],
    next_values: &[f32],
    gamma: f32,
    lam: f32,
) -> Result<Vec<f32>> {
    if rewards.len() != values.len() || rewards.len() != next_values.len() {
        bail!(
            "GAE input length mismatch: rewards={}, values={}, next_values={}",
            rewards.len(),
            values.len(),
            next_values.len()
        );
    }

    let mut gaes = compute_deltas(rewards, values, next_values, gamma);
    for t in (0..gaes.len().saturating_sub(1)).rev() {
        gaes[t] += lam * gamma * gaes[t + 1];
    }

    Ok(gaes)
}

/// One-step temporal difference errors `r_t + γ * V_{t+1} - V_t`
pub fn compute_deltas(rewards: &[f32], values: &[f32], next_values: &[f32], gamma: f32) -> Vec<f32> {
    rewards
        .iter()
        .zip(next_values)
        .zip(values)
        .map(|((&r, &v_next), &v)| r + gamma * v_next - v)
        .collect()
}
