//! Environment traits and implementations
//!
//! This module defines the continuous-control environment interface the
//! agent trains against, plus a built-in pendulum for demos and tests.

use anyhow::Result;

pub mod pendulum;
pub mod spec;

pub use spec::EnvSpec;

/// Core trait for continuous-control RL environments
///
/// Observations and actions are flat `f32` vectors. Actions are always
/// expressed in the environment's native range, as declared by
/// [`Environment::action_space`].
pub trait Environment {
    /// Reset the environment and return initial observation
    fn reset(&mut self) -> Result<Vec<f32>>;

    /// Step the environment with an action
    fn step(&mut self, action: &[f32]) -> Result<StepResult>;

    /// Get the observation space dimensions
    fn observation_space(&self) -> SpaceInfo;

    /// Get the action space dimensions and bounds
    fn action_space(&self) -> SpaceInfo;

    /// Render the current state as an RGB frame
    ///
    /// Environments without a renderer return `Ok(None)`.
    fn render(&mut self) -> Result<Option<Frame>> {
        Ok(None)
    }
}

/// Result of an environment step
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Next observation
    pub observation: Vec<f32>,

    /// Reward received
    pub reward: f32,

    /// Whether the episode terminated
    pub terminated: bool,

    /// Whether the episode was truncated
    pub truncated: bool,
}

impl StepResult {
    /// Whether the episode is over for any reason
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Space information for observations and actions
#[derive(Debug, Clone)]
pub struct SpaceInfo {
    /// Shape of the space
    pub shape: Vec<usize>,

    /// Kind of space
    pub space_type: SpaceType,
}

impl SpaceInfo {
    /// Continuous box space with per-dimension bounds
    pub fn bounded(low: Vec<f32>, high: Vec<f32>) -> Self {
        Self { shape: vec![low.len()], space_type: SpaceType::Box { low, high } }
    }

    /// Continuous box space with no finite bounds
    pub fn unbounded(dim: usize) -> Self {
        Self::bounded(vec![f32::NEG_INFINITY; dim], vec![f32::INFINITY; dim])
    }
}

/// Space data types
#[derive(Debug, Clone, PartialEq)]
pub enum SpaceType {
    /// Discrete space with n options
    Discrete(usize),

    /// Continuous space (Box) with per-dimension bounds
    Box {
        /// Lower bound per dimension
        low: Vec<f32>,
        /// Upper bound per dimension
        high: Vec<f32>,
    },
}

/// A rendered RGB frame, row-major, 3 bytes per pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// Pixel data, `width * height * 3` bytes
    pub data: Vec<u8>,
}

impl Frame {
    /// Create a frame filled with a single colour
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * 3);
        for _ in 0..width * height {
            data.extend_from_slice(&rgb);
        }
        Self { width, height, data }
    }

    /// Set a single pixel, ignoring out-of-range coordinates
    pub fn put_pixel(&mut self, x: i64, y: i64, rgb: [u8; 3]) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let offset = (y as usize * self.width + x as usize) * 3;
        self.data[offset..offset + 3].copy_from_slice(&rgb);
    }
}
