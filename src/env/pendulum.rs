//! Pendulum-v1 environment
//!
//! Classic continuous-control benchmark: swing a frictionless pendulum up
//! and keep it balanced by applying a bounded torque at the pivot.
//!
//! # Physics
//!
//! - State: [theta, theta_dot] (angle from upright, angular velocity)
//! - Observation: [cos(theta), sin(theta), theta_dot]
//! - Action: torque in [-2, 2]
//! - Reward: -(theta² + 0.1 * theta_dot² + 0.001 * torque²)
//! - Episodes never terminate; they are truncated after `max_steps`
//!
//! # Reference
//!
//! Based on OpenAI Gym Pendulum-v1:
//! <https://github.com/openai/gym/blob/master/gym/envs/classic_control/pendulum.py>

use std::f32::consts::PI;

use anyhow::{Result, bail};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::env::{Environment, Frame, SpaceInfo, StepResult};

const MAX_SPEED: f32 = 8.0;
const MAX_TORQUE: f32 = 2.0;
const DT: f32 = 0.05;
const GRAVITY: f32 = 10.0;
const MASS: f32 = 1.0;
const LENGTH: f32 = 1.0;

const FRAME_SIZE: usize = 64;

/// Pendulum-v1 environment
#[derive(Debug)]
pub struct Pendulum {
    theta: f32,
    theta_dot: f32,
    last_torque: f32,

    // Episode tracking
    steps: usize,
    max_steps: usize,

    rng: StdRng,
}

impl Pendulum {
    /// Create a pendulum truncated after `max_steps` steps (Gym uses 200)
    pub fn new(max_steps: usize) -> Self {
        Self::with_rng(max_steps, StdRng::from_entropy())
    }

    /// Create a pendulum with a reproducible initial-state generator
    pub fn with_seed(max_steps: usize, seed: u64) -> Self {
        Self::with_rng(max_steps, StdRng::seed_from_u64(seed))
    }

    fn with_rng(max_steps: usize, rng: StdRng) -> Self {
        Self { theta: 0.0, theta_dot: 0.0, last_torque: 0.0, steps: 0, max_steps, rng }
    }

    /// Wrap an angle into [-pi, pi)
    fn angle_normalize(x: f32) -> f32 {
        (x + PI).rem_euclid(2.0 * PI) - PI
    }

    fn get_observation(&self) -> Vec<f32> {
        vec![self.theta.cos(), self.theta.sin(), self.theta_dot]
    }
}

impl Default for Pendulum {
    fn default() -> Self {
        Self::new(200)
    }
}

impl Environment for Pendulum {
    fn reset(&mut self) -> Result<Vec<f32>> {
        self.theta = self.rng.gen_range(-PI..PI);
        self.theta_dot = self.rng.gen_range(-1.0..1.0);
        self.last_torque = 0.0;
        self.steps = 0;
        Ok(self.get_observation())
    }

    fn step(&mut self, action: &[f32]) -> Result<StepResult> {
        if action.len() != 1 {
            bail!("Pendulum expects a 1-dimensional action, got {}", action.len());
        }
        let torque = action[0].clamp(-MAX_TORQUE, MAX_TORQUE);
        self.last_torque = torque;

        // Cost uses the state before integration
        let theta = Self::angle_normalize(self.theta);
        let cost = theta.powi(2) + 0.1 * self.theta_dot.powi(2) + 0.001 * torque.powi(2);

        // theta_acc = 3g/(2l) * sin(theta) + 3/(m l²) * u
        let theta_acc =
            3.0 * GRAVITY / (2.0 * LENGTH) * self.theta.sin() + 3.0 / (MASS * LENGTH * LENGTH) * torque;
        self.theta_dot = (self.theta_dot + theta_acc * DT).clamp(-MAX_SPEED, MAX_SPEED);
        self.theta += self.theta_dot * DT;

        self.steps += 1;

        Ok(StepResult {
            observation: self.get_observation(),
            reward: -cost,
            terminated: false,
            truncated: self.steps >= self.max_steps,
        })
    }

    fn observation_space(&self) -> SpaceInfo {
        SpaceInfo::bounded(vec![-1.0, -1.0, -MAX_SPEED], vec![1.0, 1.0, MAX_SPEED])
    }

    fn action_space(&self) -> SpaceInfo {
        SpaceInfo::bounded(vec![-MAX_TORQUE], vec![MAX_TORQUE])
    }

    /// Draw the rod from the pivot, coloured by the last applied torque
    fn render(&mut self) -> Result<Option<Frame>> {
        let mut frame = Frame::filled(FRAME_SIZE, FRAME_SIZE, [255, 255, 255]);

        let centre = (FRAME_SIZE / 2) as f32;
        let radius = centre * 0.8;
        let intensity = (self.last_torque.abs() / MAX_TORQUE * 255.0) as u8;
        let colour = [204, intensity / 4, 255 - intensity];

        // theta = 0 points straight up; image y grows downwards
        let (sin, cos) = self.theta.sin_cos();
        let samples = (radius * 2.0) as usize;
        for i in 0..=samples {
            let t = i as f32 / samples as f32 * radius;
            let x = centre + t * sin;
            let y = centre - t * cos;
            frame.put_pixel(x.round() as i64, y.round() as i64, colour);
        }
        frame.put_pixel(centre as i64, centre as i64, [0, 0, 0]);

        Ok(Some(frame))
    }
}
