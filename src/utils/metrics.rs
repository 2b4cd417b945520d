//! Scalar metric sinks
//!
//! Training emits named scalar time series (`Loss/total_loss` at every
//! update, `Main/episode_reward` at every episode, ...). A [`MetricsSink`]
//! receives them; two implementations are provided:
//!
//! - [`MemorySink`]: keeps every event in memory, handy for tests and for
//!   post-run summaries
//! - [`JsonlSink`]: appends one JSON object per scalar to a file
//! - [`TensorboardSink`]: writes TensorBoard event files

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tensorboard::summary_writer::SummaryWriter;

/// Tag for the total PPO loss
pub const TOTAL_LOSS: &str = "Loss/total_loss";
/// Tag for the clipped surrogate objective
pub const CLIPPED_SURR: &str = "Loss/clipped_surr";
/// Tag for the value function loss
pub const VF_LOSS: &str = "Loss/vf_loss";
/// Tag for the mean policy entropy
pub const ENTROPY: &str = "Loss/entropy";
/// Tag for the undiscounted episode return
pub const EPISODE_REWARD: &str = "Main/episode_reward";
/// Tag for the episode length
pub const EPISODE_STEPS: &str = "Main/episode_steps";

/// A single scalar observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarEvent {
    /// Series name
    pub tag: String,
    /// Value
    pub value: f64,
    /// Monotonic step index within the series
    pub step: usize,
}

/// Destination for scalar time series
pub trait MetricsSink {
    /// Record one scalar
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()>;

    /// Flush buffered events
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: MetricsSink + ?Sized> MetricsSink for &mut S {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()> {
        (**self).add_scalar(tag, value, step)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// In-memory metrics sink
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Vec<ScalarEvent>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events in arrival order
    pub fn events(&self) -> &[ScalarEvent] {
        &self.events
    }

    /// `(step, value)` pairs for one series
    pub fn series(&self, tag: &str) -> Vec<(usize, f64)> {
        self.events.iter().filter(|e| e.tag == tag).map(|e| (e.step, e.value)).collect()
    }

    /// Most recent value of a series
    pub fn last(&self, tag: &str) -> Option<f64> {
        self.events.iter().rev().find(|e| e.tag == tag).map(|e| e.value)
    }
}

impl MetricsSink for MemorySink {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()> {
        self.events.push(ScalarEvent { tag: tag.to_string(), value, step });
        Ok(())
    }
}

/// Metrics sink writing JSON lines to a file
pub struct JsonlSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonlSink {
    /// Create (or truncate) a JSON-lines file at `path`
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
        }
        let file = File::create(&path)
            .with_context(|| format!("Failed to create metrics file {}", path.display()))?;
        Ok(Self { path, writer: BufWriter::new(file) })
    }

    /// Create `metrics.jsonl` inside a fresh `<base>/<UTC timestamp>` directory
    pub fn in_timestamped_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S").to_string();
        Self::create(base.as_ref().join(stamp).join("metrics.jsonl"))
    }

    /// Path of the file being written
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every event back from a JSON-lines file
    pub fn read_events<P: AsRef<Path>>(path: P) -> Result<Vec<ScalarEvent>> {
        let text = fs::read_to_string(path)?;
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(anyhow::Error::from))
            .collect()
    }
}

impl MetricsSink for JsonlSink {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()> {
        let event = ScalarEvent { tag: tag.to_string(), value, step };
        serde_json::to_writer(&mut self.writer, &event)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Metrics sink writing TensorBoard event files
pub struct TensorboardSink {
    logdir: PathBuf,
    writer: SummaryWriter,
}

impl TensorboardSink {
    /// Write event files into `logdir`, creating it if needed
    pub fn create<P: AsRef<Path>>(logdir: P) -> Result<Self> {
        let logdir = logdir.as_ref().to_path_buf();
        fs::create_dir_all(&logdir)
            .with_context(|| format!("Failed to create log directory {}", logdir.display()))?;
        let writer = SummaryWriter::new(&logdir);
        Ok(Self { logdir, writer })
    }

    /// Write event files into a fresh `<base>/<UTC timestamp>` directory
    pub fn in_timestamped_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S").to_string();
        Self::create(base.as_ref().join(stamp))
    }

    /// Directory holding the event files
    pub fn logdir(&self) -> &Path {
        &self.logdir
    }
}

impl MetricsSink for TensorboardSink {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()> {
        self.writer.add_scalar(tag, value as f32, step);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush();
        Ok(())
    }
}
