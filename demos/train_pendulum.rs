//! Train a PPO agent on the built-in pendulum
//!
//! Usage:
//!   cargo run --release --example train_pendulum [run_config.json] [--tensorboard]
//!
//! Metrics go to `logs/<timestamp>/metrics.jsonl`, or to TensorBoard event
//! files in `logs/<timestamp>/` with `--tensorboard`. Checkpoints and the
//! effective run config are written next to them.

use anyhow::Result;
use ppo_continuous::prelude::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let use_tensorboard = args.iter().any(|a| a == "--tensorboard");
    let mut config = match args.iter().find(|a| !a.starts_with("--")) {
        Some(path) => RunConfig::load_json(path)?,
        None => RunConfig::default(),
    };

    let (mut metrics, run_dir) = if use_tensorboard {
        let sink = TensorboardSink::in_timestamped_dir("logs")?;
        let run_dir = sink.logdir().to_path_buf();
        (Box::new(sink) as Box<dyn MetricsSink>, run_dir)
    } else {
        let sink = JsonlSink::in_timestamped_dir("logs")?;
        let run_dir = sink.path().parent().map(|p| p.to_path_buf()).unwrap_or_default();
        (Box::new(sink) as Box<dyn MetricsSink>, run_dir)
    };
    config.train.checkpoint_dir = run_dir.clone();
    config.save_json(run_dir.join("run_config.json"))?;

    tracing::info!("Starting pendulum training, logging to {}", run_dir.display());

    let mut env = Pendulum::new(config.train.max_steps);
    let mut agent = PPOAgent::from_env(&env, config.ppo.clone())?;
    let mut trainer = PPOTrainer::new(config.train.clone())?;

    let summary = trainer.train(&mut agent, &mut env, metrics.as_mut())?;

    if let Some(last) = &summary.last_episode {
        tracing::info!("Last episode reward: {:.2}", last.reward);
    }
    let reward = trainer.evaluate(&agent, &mut env, None)?;
    tracing::info!("Deterministic evaluation reward: {:.2}", reward);

    if let Some(path) = summary.checkpoints.last() {
        tracing::info!("Final checkpoint: {}", path.display());
    }

    Ok(())
}
