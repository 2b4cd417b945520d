//! Experience storage for on-policy training
//!
//! - [`trajectory`]: per-episode transition storage and minibatch sampling
//! - [`gae`]: Generalized Advantage Estimation over a finished episode

pub mod gae;
pub mod trajectory;

pub use gae::{compute_deltas, compute_gaes};
pub use trajectory::{Minibatch, Trajectory, Transition, sample_indices};
