//! Frame sinks for evaluation rollouts
//!
//! Evaluation can hand every rendered frame to a [`FrameSink`]. Encoding to
//! a video container is left to the sink implementation; [`FrameRecorder`]
//! simply keeps the frames in memory.

use anyhow::{Result, bail};

use crate::env::Frame;

/// Destination for rendered frames
pub trait FrameSink {
    /// Append one frame
    fn append(&mut self, frame: &Frame) -> Result<()>;

    /// Finish the stream; no frames may be appended afterwards
    fn close(&mut self) -> Result<()>;
}

/// In-memory frame sink
#[derive(Debug, Clone)]
pub struct FrameRecorder {
    fps: u32,
    frames: Vec<Frame>,
    closed: bool,
}

impl FrameRecorder {
    /// Create a recorder that tags its stream with `fps`
    pub fn new(fps: u32) -> Self {
        Self { fps, frames: Vec::new(), closed: false }
    }

    /// Frame rate of the stream
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Recorded frames
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Playback length in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.fps == 0 {
            return 0.0;
        }
        self.frames.len() as f64 / self.fps as f64
    }
}

impl Default for FrameRecorder {
    fn default() -> Self {
        Self::new(30)
    }
}

impl FrameSink for FrameRecorder {
    fn append(&mut self, frame: &Frame) -> Result<()> {
        if self.closed {
            bail!("Cannot append to a closed frame stream");
        }
        if let Some(first) = self.frames.first() {
            if (first.width, first.height) != (frame.width, frame.height) {
                bail!(
                    "Frame size changed mid-stream: {}x{} then {}x{}",
                    first.width,
                    first.height,
                    frame.width,
                    frame.height
                );
            }
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_collects_frames() {
        let mut recorder = FrameRecorder::new(10);
        for _ in 0..25 {
            recorder.append(&Frame::filled(2, 2, [0, 0, 0])).unwrap();
        }
        recorder.close().unwrap();

        assert_eq!(recorder.frames().len(), 25);
        assert!(recorder.is_closed());
        assert!((recorder.duration_secs() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_recorder_rejects_after_close() {
        let mut recorder = FrameRecorder::default();
        recorder.close().unwrap();
        assert!(recorder.append(&Frame::filled(1, 1, [0, 0, 0])).is_err());
    }

    #[test]
    fn test_recorder_rejects_size_change() {
        let mut recorder = FrameRecorder::default();
        recorder.append(&Frame::filled(2, 2, [0, 0, 0])).unwrap();
        assert!(recorder.append(&Frame::filled(3, 2, [0, 0, 0])).is_err());
    }
}
