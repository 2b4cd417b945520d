//! Policy and neural network wrappers
//!
//! This module provides the Gaussian actor-critic network (tch-rs) and the
//! diagonal Gaussian action distribution built from its outputs.

pub mod distribution;
pub mod mlp;

pub use distribution::DiagGaussian;
pub use mlp::{GaussianMlpPolicy, MlpConfig};
