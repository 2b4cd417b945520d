//! Diagonal Gaussian action distribution
//!
//! Each action dimension is an independent Normal with the network's mean
//! output as location and `exp(log_std)` as scale. `log_std` is a learned,
//! state-independent vector, so the same scale is broadcast over the batch.
//!
//! ```text
//! log p(a) = Σ_i [ -(a_i - μ_i)² / (2σ_i²) - ln σ_i - ½ ln(2π) ]
//! H_i      = ½ + ½ ln(2π) + ln σ_i
//! ```

use tch::{Kind, Tensor};

/// ½ ln(2π)
const HALF_LOG_2PI: f64 = 0.918_938_533_204_672_7;

/// Independent per-dimension Normal distribution
pub struct DiagGaussian {
    mean: Tensor,
    log_std: Tensor,
    std: Tensor,
}

impl DiagGaussian {
    /// Build from a mean `[batch, action_dim]` and a `log_std` `[action_dim]`
    pub fn new(mean: &Tensor, log_std: &Tensor) -> Self {
        let log_std = log_std.expand_as(mean);
        let std = log_std.exp();
        Self { mean: mean.shallow_clone(), log_std, std }
    }

    /// Draw one sample per row, same shape as the mean
    pub fn sample(&self) -> Tensor {
        let noise = Tensor::randn_like(&self.mean);
        &self.mean + &self.std * noise
    }

    /// Mean of the distribution (used for deterministic actions)
    pub fn mode(&self) -> Tensor {
        self.mean.shallow_clone()
    }

    /// Log density of `actions`, summed over the action dimension
    ///
    /// Returns one scalar per row: `[batch]`.
    pub fn log_prob(&self, actions: &Tensor) -> Tensor {
        let z = (actions - &self.mean) / &self.std;
        let per_dim = z.square() * -0.5 - &self.log_std - HALF_LOG_2PI;
        per_dim.sum_dim_intlist(-1, false, Kind::Float)
    }

    /// Per-dimension differential entropy, `[batch, action_dim]`
    pub fn entropy(&self) -> Tensor {
        &self.log_std + (0.5 + HALF_LOG_2PI)
    }
}
