//! Environment specification captured at agent construction
//!
//! The agent acts in a normalized action space `[-1, 1]^d`. `EnvSpec` holds
//! the affine map between that space and the environment's native bounds:
//!
//! ```text
//! action_bound = (high - low) / 2
//! action_shift = (high + low) / 2
//! native       = normalized * action_bound + action_shift
//! ```

use anyhow::{Result, bail};

use super::{Environment, SpaceType};

/// Immutable description of an environment's observation and action spaces
#[derive(Debug, Clone, PartialEq)]
pub struct EnvSpec {
    obs_dim: usize,
    action_low: Vec<f32>,
    action_high: Vec<f32>,
    action_bound: Vec<f32>,
    action_shift: Vec<f32>,
}

impl EnvSpec {
    /// Build a spec from explicit dimensions and action bounds
    ///
    /// Fails if the bounds are not finite, not ordered, or not the same
    /// length.
    pub fn new(obs_dim: usize, action_low: Vec<f32>, action_high: Vec<f32>) -> Result<Self> {
        if obs_dim == 0 {
            bail!("Observation dimension must be positive");
        }
        if action_low.is_empty() {
            bail!("Action dimension must be positive");
        }
        if action_low.len() != action_high.len() {
            bail!(
                "Action bounds length mismatch: low has {}, high has {}",
                action_low.len(),
                action_high.len()
            );
        }
        for (i, (&lo, &hi)) in action_low.iter().zip(&action_high).enumerate() {
            if !lo.is_finite() || !hi.is_finite() {
                bail!("Action bounds for dimension {} must be finite, got [{}, {}]", i, lo, hi);
            }
            if lo >= hi {
                bail!("Action bounds for dimension {} must satisfy low < high, got [{}, {}]", i, lo, hi);
            }
        }

        let action_bound = action_low.iter().zip(&action_high).map(|(l, h)| (h - l) / 2.0).collect();
        let action_shift = action_low.iter().zip(&action_high).map(|(l, h)| (h + l) / 2.0).collect();

        Ok(Self { obs_dim, action_low, action_high, action_bound, action_shift })
    }

    /// Build an `EnvSpec` from an environment's declared spaces
    ///
    /// Only flat observation vectors and bounded continuous action spaces
    /// are accepted.
    pub fn from_env<E: Environment + ?Sized>(env: &E) -> Result<Self> {
        let obs_space = env.observation_space();
        if obs_space.shape.len() != 1 {
            bail!("Expected a flat observation space, got shape {:?}", obs_space.shape);
        }

        let action_space = env.action_space();
        let (low, high) = match action_space.space_type {
            SpaceType::Box { low, high } => (low, high),
            SpaceType::Discrete(n) => {
                bail!("Discrete action spaces are not supported (got Discrete({}))", n)
            }
        };
        if action_space.shape.len() != 1 || action_space.shape[0] != low.len() {
            bail!(
                "Action space shape {:?} does not match {} declared bounds",
                action_space.shape,
                low.len()
            );
        }

        Self::new(obs_space.shape[0], low, high)
    }

    /// Observation dimensionality
    pub fn obs_dim(&self) -> usize {
        self.obs_dim
    }

    /// Action dimensionality
    pub fn action_dim(&self) -> usize {
        self.action_low.len()
    }

    /// Lower action bounds
    pub fn action_low(&self) -> &[f32] {
        &self.action_low
    }

    /// Upper action bounds
    pub fn action_high(&self) -> &[f32] {
        &self.action_high
    }

    /// Half-width of the native action range per dimension
    pub fn action_bound(&self) -> &[f32] {
        &self.action_bound
    }

    /// Centre of the native action range per dimension
    pub fn action_shift(&self) -> &[f32] {
        &self.action_shift
    }

    /// Map a normalized action in `[-1, 1]^d` to the native range
    pub fn scale_action(&self, normalized: &[f32]) -> Vec<f32> {
        normalized
            .iter()
            .zip(&self.action_bound)
            .zip(&self.action_shift)
            .map(|((&a, &bound), &shift)| a * bound + shift)
            .collect()
    }

    /// Map a native action back to the normalized range
    pub fn unscale_action(&self, native: &[f32]) -> Vec<f32> {
        native
            .iter()
            .zip(&self.action_bound)
            .zip(&self.action_shift)
            .map(|((&a, &bound), &shift)| (a - shift) / bound)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::pendulum::Pendulum;

    #[test]
    fn test_bound_and_shift() {
        let spec = EnvSpec::new(3, vec![-2.0, 0.0], vec![2.0, 10.0]).unwrap();
        assert_eq!(spec.action_bound(), &[2.0, 5.0]);
        assert_eq!(spec.action_shift(), &[0.0, 5.0]);
        assert_eq!(spec.action_dim(), 2);
        assert_eq!(spec.obs_dim(), 3);
    }

    #[test]
    fn test_scale_roundtrip_edges() {
        let spec = EnvSpec::new(1, vec![0.0], vec![10.0]).unwrap();
        assert_eq!(spec.scale_action(&[-1.0]), vec![0.0]);
        assert_eq!(spec.scale_action(&[1.0]), vec![10.0]);
        assert_eq!(spec.unscale_action(&[5.0]), vec![0.0]);
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(EnvSpec::new(1, vec![1.0], vec![1.0]).is_err());
        assert!(EnvSpec::new(1, vec![-1.0], vec![1.0, 2.0]).is_err());
        assert!(EnvSpec::new(1, vec![f32::NEG_INFINITY], vec![1.0]).is_err());
        assert!(EnvSpec::new(0, vec![-1.0], vec![1.0]).is_err());
        assert!(EnvSpec::new(2, vec![], vec![]).is_err());
    }

    #[test]
    fn test_from_env() {
        let env = Pendulum::new(200);
        let spec = EnvSpec::from_env(&env).unwrap();
        assert_eq!(spec.obs_dim(), 3);
        assert_eq!(spec.action_dim(), 1);
        assert_eq!(spec.action_bound(), &[2.0]);
        assert_eq!(spec.action_shift(), &[0.0]);
    }
}
