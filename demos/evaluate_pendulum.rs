//! Evaluate a saved pendulum checkpoint and record its frames
//!
//! Usage:
//!   cargo run --release --example evaluate_pendulum <checkpoint.safetensors> [run_config.json]

use anyhow::{Result, bail};
use ppo_continuous::prelude::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <checkpoint.safetensors> [run_config.json]", args[0]);
        bail!("missing checkpoint path");
    }
    let config = match args.get(2) {
        Some(path) => RunConfig::load_json(path)?,
        None => RunConfig::default(),
    };

    let mut env = Pendulum::new(config.train.max_steps);
    let mut agent = PPOAgent::from_env(&env, config.ppo.clone())?;
    agent.load(&args[1])?;

    let trainer = PPOTrainer::new(config.train.clone())?;
    let mut recorder = FrameRecorder::new(30);
    let reward = trainer.evaluate(&agent, &mut env, Some(&mut recorder))?;

    println!("Reward: {:.2}", reward);
    println!(
        "Recorded {} frames ({:.1}s at {} fps)",
        recorder.frames().len(),
        recorder.duration_secs(),
        recorder.fps()
    );

    Ok(())
}
