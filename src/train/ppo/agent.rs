//! PPO agent: action selection and the learner update
//!
//! The agent owns the policy network (including `log_std`), its Adam
//! optimizer, the hyperparameters and the environment spec captured at
//! construction. Actions are chosen in the normalized space `[-1, 1]^d`
//! and rescaled to the environment's native range on the way out; stored
//! native actions are mapped back before they are re-evaluated.

use std::path::Path;

use anyhow::{Result, bail};
use tch::{Device, Kind, Tensor, nn};

use super::{config::PPOConfig, loss::*, stats::TrainingStats};
use crate::{
    buffer::Minibatch,
    env::{EnvSpec, Environment},
    policy::mlp::{GaussianMlpPolicy, MlpConfig},
};

/// Result of choosing an action for one observation
#[derive(Debug, Clone, PartialEq)]
pub struct ActOutput {
    /// Action in the environment's native range
    pub action: Vec<f32>,

    /// Value estimate of the observation
    pub value: f32,

    /// Log probability of the clipped, normalized action
    pub log_prob: f32,
}

/// Proximal Policy Optimization agent for continuous actions
pub struct PPOAgent {
    config: PPOConfig,
    spec: EnvSpec,
    policy: GaussianMlpPolicy,
    optimizer: nn::Optimizer,
    // Tensor copies of the `EnvSpec` affine map, for batched unscaling
    action_bound: Tensor,
    action_shift: Tensor,
}

impl PPOAgent {
    /// Create an agent for an environment described by `spec`
    ///
    /// # Arguments
    ///
    /// * `spec` - Observation/action dimensions and action bounds
    /// * `config` - PPO hyperparameters
    pub fn new(spec: EnvSpec, config: PPOConfig) -> Result<Self> {
        config.validate()?;

        let mlp_config = MlpConfig { hidden_units: config.hidden_units.clone() };
        let policy = GaussianMlpPolicy::with_config(spec.obs_dim() as i64, spec.action_dim() as i64, mlp_config)?;
        let optimizer = policy.optimizer(config.learning_rate)?;

        let device = policy.device();
        let action_bound = Tensor::from_slice(spec.action_bound()).to_device(device);
        let action_shift = Tensor::from_slice(spec.action_shift()).to_device(device);

        policy.log_summary();

        Ok(Self { config, spec, policy, optimizer, action_bound, action_shift })
    }

    /// Create an agent from an environment's declared spaces
    pub fn from_env<E: Environment + ?Sized>(env: &E, config: PPOConfig) -> Result<Self> {
        Self::new(EnvSpec::from_env(env)?, config)
    }

    /// Get the configuration
    pub fn config(&self) -> &PPOConfig {
        &self.config
    }

    /// Get the environment spec
    pub fn spec(&self) -> &EnvSpec {
        &self.spec
    }

    /// Get reference to the policy
    pub fn policy(&self) -> &GaussianMlpPolicy {
        &self.policy
    }

    /// Current per-dimension log standard deviation
    pub fn log_std(&self) -> Result<Vec<f32>> {
        let log_std = self.policy.log_std().detach().to_device(Device::Cpu);
        Ok(Vec::<f32>::try_from(&log_std)?)
    }

    /// Choose an action for a single observation
    ///
    /// With `deterministic` the distribution mean is used, otherwise a
    /// sample. The normalized action is clipped to `[-1, 1]` before its log
    /// probability is taken and before it is rescaled, so the stored
    /// log-prob always describes the action actually sent to the
    /// environment.
    pub fn act(&self, state: &[f32], deterministic: bool) -> Result<ActOutput> {
        let obs_dim = self.spec.obs_dim();
        if state.len() != obs_dim {
            bail!("Observation has {} elements, expected {}", state.len(), obs_dim);
        }

        let obs = Tensor::from_slice(state).view([1, obs_dim as i64]).to_device(self.policy.device());

        tch::no_grad(|| -> Result<ActOutput> {
            let (mean, value) = self.policy.forward(&obs);
            let dist = self.policy.distribution(&mean);

            let action = if deterministic { dist.mode() } else { dist.sample() };
            let action = action.clamp(-1.0, 1.0);
            let log_prob = dist.log_prob(&action);

            let normalized: Vec<f32> = Vec::try_from(&action.view([-1]).to_device(Device::Cpu))?;
            let action = self.spec.scale_action(&normalized);
            let value = f64::try_from(value.get(0))? as f32;
            let log_prob = f64::try_from(log_prob.get(0))? as f32;

            Ok(ActOutput { action, value, log_prob })
        })
    }

    /// Re-evaluate stored actions under the current policy
    ///
    /// # Arguments
    /// * `observations` - `[batch, obs_dim]`
    /// * `actions` - native-range actions `[batch, action_dim]`
    ///
    /// # Returns
    /// (log_probs `[batch]`, entropy `[batch, action_dim]`, values `[batch]`)
    pub fn evaluate_actions(&self, observations: &Tensor, actions: &Tensor) -> (Tensor, Tensor, Tensor) {
        let (mean, values) = self.policy.forward(observations);
        let dist = self.policy.distribution(&mean);

        let log_probs = dist.log_prob(&self.normalize_actions(actions));

        (log_probs, dist.entropy(), values)
    }

    /// Batched [`EnvSpec::unscale_action`]: native `[batch, action_dim]` to `[-1, 1]`
    fn normalize_actions(&self, actions: &Tensor) -> Tensor {
        (actions - &self.action_shift) / &self.action_bound
    }

    /// Run one PPO gradient step on a minibatch
    ///
    /// Computes the clipped surrogate, the one-step TD value loss and the
    /// entropy bonus, then applies a single Adam step to every network
    /// weight and `log_std`. A non-finite loss or gradient aborts before
    /// the parameters are touched.
    pub fn learn(&mut self, batch: &Minibatch) -> Result<TrainingStats> {
        if batch.is_empty() {
            bail!("Cannot learn from an empty minibatch");
        }
        if batch.obs_dim() != self.spec.obs_dim() || batch.action_dim() != self.spec.action_dim() {
            bail!(
                "Minibatch shape (obs_dim={}, action_dim={}) does not match agent (obs_dim={}, action_dim={})",
                batch.obs_dim(),
                batch.action_dim(),
                self.spec.obs_dim(),
                self.spec.action_dim()
            );
        }

        let device = self.policy.device();
        let n = batch.size() as i64;
        let observations =
            Tensor::from_slice(&batch.observations).view([n, batch.obs_dim() as i64]).to_device(device);
        let actions = Tensor::from_slice(&batch.actions).view([n, batch.action_dim() as i64]).to_device(device);
        let old_log_probs = Tensor::from_slice(&batch.log_probs).to_device(device);
        let next_values = Tensor::from_slice(&batch.next_values).to_device(device);
        let rewards = Tensor::from_slice(&batch.rewards).to_device(device);
        let advantages = Tensor::from_slice(&batch.advantages).to_device(device);

        // Forward pass under the current parameters
        let (log_probs, entropy, values) = self.evaluate_actions(&observations, &actions);

        // Compute losses
        let (surrogate, clip_fraction, approx_kl) =
            compute_policy_loss(&log_probs, &old_log_probs, &advantages, self.config.clip_ratio);
        let targets = compute_td_targets(&rewards, &next_values, self.config.gamma);
        let value_loss = compute_value_loss(&values, &targets);
        let entropy_bonus = compute_entropy_bonus(&entropy);
        let loss = compute_total_loss(&surrogate, &value_loss, &entropy_bonus, self.config.c1, self.config.c2);

        let total_loss_val = f64::try_from(&loss)?;
        if !total_loss_val.is_finite() {
            bail!("PPO loss is not finite ({}); aborting before the optimizer step", total_loss_val);
        }

        // Backward pass
        self.optimizer.zero_grad();
        loss.backward();
        self.check_gradients()?;

        // Optimizer step
        self.optimizer.step();

        Ok(TrainingStats::new(
            total_loss_val,
            f64::try_from(&surrogate)?,
            f64::try_from(&value_loss)?,
            f64::try_from(&entropy_bonus)?,
            clip_fraction,
            approx_kl,
        ))
    }

    /// Fail if any gradient holds NaN or infinity
    fn check_gradients(&self) -> Result<()> {
        tch::no_grad(|| -> Result<()> {
            for (name, var) in self.policy.var_store().variables() {
                let grad = var.grad();
                if !grad.defined() {
                    continue;
                }
                let magnitude = f64::try_from(grad.abs().sum(Kind::Double))?;
                if !magnitude.is_finite() {
                    bail!("Gradient of '{}' is not finite; aborting before the optimizer step", name);
                }
            }
            Ok(())
        })
    }

    /// Save policy weights (network and `log_std`)
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.policy.save(path)
    }

    /// Load policy weights saved from an identically shaped agent
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.policy.load(&path)?;
        tracing::info!("Loaded policy weights from {}", path.as_ref().display());
        self.policy.log_summary();
        Ok(())
    }
}
