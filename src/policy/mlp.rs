//! Multi-Layer Perceptron (MLP) Gaussian policy for continuous actions
//!
//! The policy and value functions use separate towers so value regression
//! never shares features with the action mean. The action standard deviation
//! is a free parameter (`log_std`) stored in the same `VarStore`, which makes
//! it part of the optimizer's variable list.
//!
//! # Architecture
//!
//! ```text
//!               Input (observations)
//!              /                    \
//!   [Dense(h0)] Tanh            [Dense(h0)] Tanh
//!        ...                          ...
//!   [Dense(hn)] Tanh            [Dense(hn)] Tanh
//!        |                            |
//!   [Dense(action_dim)] Tanh     [Dense(1)]
//!        |                            |
//!   Action mean in [-1, 1]          Value
//!
//!   log_std: [action_dim] (state-independent, trainable)
//! ```

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tch::{
    Device, Tensor,
    nn::{self, Init, Module, OptimizerConfig},
};

use super::distribution::DiagGaussian;

/// Configuration for MLP policy architecture
///
/// Every hidden layer uses tanh, as does the action-mean head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Hidden layer sizes, shared by the policy and value towers
    pub hidden_units: Vec<i64>,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self { hidden_units: vec![24, 16] }
    }
}

/// Actor-critic MLP with a diagonal Gaussian policy head
pub struct GaussianMlpPolicy {
    vs: nn::VarStore,
    policy_tower: nn::Sequential,
    value_tower: nn::Sequential,
    log_std: Tensor,
    obs_dim: i64,
    action_dim: i64,
    device: Device,
    config: MlpConfig,
}

impl GaussianMlpPolicy {
    /// Create a policy with the default `(24, 16)` tanh architecture
    pub fn new(obs_dim: i64, action_dim: i64) -> Result<Self> {
        Self::with_config(obs_dim, action_dim, MlpConfig::default())
    }

    /// Create a policy with custom configuration
    ///
    /// # Arguments
    ///
    /// * `obs_dim` - Observation space dimensionality
    /// * `action_dim` - Action space dimensionality
    /// * `config` - Architecture configuration
    pub fn with_config(obs_dim: i64, action_dim: i64, config: MlpConfig) -> Result<Self> {
        if obs_dim <= 0 || action_dim <= 0 {
            bail!("Policy dimensions must be positive (obs_dim={}, action_dim={})", obs_dim, action_dim);
        }
        if config.hidden_units.is_empty() {
            bail!("At least one hidden layer is required");
        }
        if let Some(&bad) = config.hidden_units.iter().find(|&&units| units <= 0) {
            bail!("Hidden layer sizes must be positive, got {}", bad);
        }

        let device = Device::cuda_if_available();
        tracing::info!("GaussianMlpPolicy using device: {:?}", device);
        let vs = nn::VarStore::new(device);
        let root = vs.root();

        let policy_tower = Self::tower(&(&root / "policy"), obs_dim, &config)
            .add(nn::linear(&root / "policy" / "mean", last_units(&config), action_dim, Default::default()))
            .add_fn(|x| x.tanh());
        let value_tower = Self::tower(&(&root / "value"), obs_dim, &config)
            .add(nn::linear(&root / "value" / "out", last_units(&config), 1, Default::default()));

        let log_std = root.var("log_std", &[action_dim], Init::Const(0.0));

        Ok(Self { vs, policy_tower, value_tower, log_std, obs_dim, action_dim, device, config })
    }

    /// Hidden layers for one tower
    fn tower(path: &nn::Path, obs_dim: i64, config: &MlpConfig) -> nn::Sequential {
        let mut seq = nn::seq();
        let mut in_dim = obs_dim;
        for (i, &units) in config.hidden_units.iter().enumerate() {
            seq = seq
                .add(nn::linear(path / format!("fc{}", i), in_dim, units, Default::default()))
                .add_fn(|x| x.tanh());
            in_dim = units;
        }
        seq
    }

    /// Forward pass: action means `[batch, action_dim]` and values `[batch]`
    pub fn forward(&self, obs: &Tensor) -> (Tensor, Tensor) {
        let mean = self.policy_tower.forward(obs);
        let values = self.value_tower.forward(obs).squeeze_dim(-1);
        (mean, values)
    }

    /// Action distribution for the given means under the current `log_std`
    pub fn distribution(&self, mean: &Tensor) -> DiagGaussian {
        DiagGaussian::new(mean, &self.log_std)
    }

    /// Current `log_std` parameter
    pub fn log_std(&self) -> &Tensor {
        &self.log_std
    }

    /// Observation dimensionality the network was built for
    pub fn obs_dim(&self) -> i64 {
        self.obs_dim
    }

    /// Action dimensionality the network was built for
    pub fn action_dim(&self) -> i64 {
        self.action_dim
    }

    /// Architecture configuration
    pub fn config(&self) -> &MlpConfig {
        &self.config
    }

    /// Get the device this policy is on (CPU or CUDA)
    pub fn device(&self) -> Device {
        self.device
    }

    /// Get reference to variable store
    pub fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }

    /// Create an Adam optimizer over every trainable variable, `log_std` included
    pub fn optimizer(&self, learning_rate: f64) -> Result<nn::Optimizer> {
        Ok(nn::Adam::default().build(&self.vs, learning_rate)?)
    }

    /// Number of trainable scalars
    pub fn num_parameters(&self) -> i64 {
        self.vs.trainable_variables().iter().map(|t| t.numel() as i64).sum()
    }

    /// Log a layer-by-layer summary of the variable store
    pub fn log_summary(&self) {
        let mut variables: Vec<(String, Vec<i64>)> =
            self.vs.variables().into_iter().map(|(name, t)| (name, t.size())).collect();
        variables.sort();

        tracing::info!(
            "Policy: obs_dim={}, action_dim={}, hidden={:?}",
            self.obs_dim,
            self.action_dim,
            self.config.hidden_units
        );
        for (name, shape) in &variables {
            tracing::info!("  {:<24} {:?}", name, shape);
        }
        tracing::info!("  total trainable parameters: {}", self.num_parameters());
    }

    /// Save model parameters to a file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        self.vs.save(path)?;
        Ok(())
    }

    /// Load model parameters from a file
    ///
    /// The file must come from a policy with identical shapes.
    pub fn load<P: AsRef<std::path::Path>>(&mut self, path: P) -> Result<()> {
        self.vs.load(path)?;
        Ok(())
    }
}

fn last_units(config: &MlpConfig) -> i64 {
    config.hidden_units.last().copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::Kind;

    #[test]
    fn test_forward_shapes() {
        let policy = GaussianMlpPolicy::new(3, 2).unwrap();
        let obs = Tensor::randn([8, 3], (Kind::Float, policy.device()));

        let (mean, values) = policy.forward(&obs);

        assert_eq!(mean.size(), vec![8, 2]);
        assert_eq!(values.size(), vec![8]);
    }

    #[test]
    fn test_mean_is_bounded() {
        let policy = GaussianMlpPolicy::new(3, 2).unwrap();
        let obs = Tensor::randn([64, 3], (Kind::Float, policy.device())) * 100.0;

        let (mean, _) = policy.forward(&obs);
        let max_abs = f64::try_from(mean.abs().max()).unwrap();
        assert!(max_abs <= 1.0, "tanh head must keep means in [-1, 1], got {}", max_abs);
    }

    #[test]
    fn test_hidden_layers_are_tanh() {
        // Hidden activations lie in [-1, 1], so |value| <= sum|w_out| + |b_out|
        let policy = GaussianMlpPolicy::new(3, 1).unwrap();
        let variables = policy.var_store().variables();
        let bound = f64::try_from(variables["value.out.weight"].abs().sum(Kind::Float)).unwrap()
            + f64::try_from(variables["value.out.bias"].abs().sum(Kind::Float)).unwrap();

        let obs = Tensor::randn([64, 3], (Kind::Float, policy.device())) * 1e4;
        let (_, values) = policy.forward(&obs);
        let max_abs = f64::try_from(values.abs().max()).unwrap();
        assert!(max_abs <= bound + 1e-4, "|value| {} exceeds tanh bound {}", max_abs, bound);
    }

    #[test]
    fn test_log_std_starts_at_zero_and_is_trainable() {
        let policy = GaussianMlpPolicy::new(3, 2).unwrap();
        let log_std: Vec<f32> = Vec::try_from(policy.log_std()).unwrap();
        assert_eq!(log_std, vec![0.0, 0.0]);
        assert!(policy.log_std().requires_grad());
        assert!(policy.var_store().variables().contains_key("log_std"));
    }

    #[test]
    fn test_separate_towers() {
        let config = MlpConfig { hidden_units: vec![8, 4, 4] };
        let policy = GaussianMlpPolicy::with_config(5, 1, config).unwrap();
        let variables = policy.var_store().variables();

        for name in ["policy.fc0.weight", "policy.fc2.weight", "policy.mean.weight", "value.fc0.weight", "value.out.weight"] {
            assert!(variables.contains_key(name), "missing {}", name);
        }
        assert_eq!(variables["value.out.weight"].size(), vec![1, 4]);
        assert_eq!(variables["policy.mean.weight"].size(), vec![1, 4]);
    }

    #[test]
    fn test_invalid_config() {
        assert!(GaussianMlpPolicy::new(0, 2).is_err());
        let config = MlpConfig { hidden_units: vec![] };
        assert!(GaussianMlpPolicy::with_config(3, 1, config).is_err());
        let config = MlpConfig { hidden_units: vec![8, 0] };
        assert!(GaussianMlpPolicy::with_config(3, 1, config).is_err());
    }

    #[test]
    fn test_num_parameters() {
        // policy: 3*24+24 + 24*16+16 + 16*2+2, value: 3*24+24 + 24*16+16 + 16+1, log_std: 2
        let policy = GaussianMlpPolicy::new(3, 2).unwrap();
        let expected = (96 + 400 + 34) + (96 + 400 + 17) + 2;
        assert_eq!(policy.num_parameters(), expected);
    }

    #[test]
    fn test_save_load() {
        let policy = GaussianMlpPolicy::new(3, 2).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.safetensors");

        let obs = Tensor::randn([4, 3], (Kind::Float, policy.device()));
        let (mean_before, values_before) = policy.forward(&obs);

        policy.save(&path).unwrap();

        let mut policy2 = GaussianMlpPolicy::new(3, 2).unwrap();
        policy2.load(&path).unwrap();
        let (mean_after, values_after) = policy2.forward(&obs);

        let diff = f64::try_from((&mean_before - &mean_after).abs().max()).unwrap()
            + f64::try_from((&values_before - &values_after).abs().max()).unwrap();
        assert!(diff < 1e-6);
    }
}
