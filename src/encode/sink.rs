use std::path::PathBuf;

use crate::foundation::core::Fps;
use crate::foundation::error::{ClipreelError, ClipreelResult};

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
    /// Optional mixed audio file muxed next to the frames.
    pub audio: Option<PathBuf>,
}

impl SinkConfig {
    /// Byte length of one premultiplied RGBA8 frame.
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Sink contract for consuming rendered frames in timeline order.
///
/// `push_frame` is called with strictly increasing indices, each call returning only once the
/// frame has been accepted.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> ClipreelResult<()>;
    /// Push one premultiplied RGBA8 frame.
    fn push_frame(&mut self, idx: u64, frame: &[u8]) -> ClipreelResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> ClipreelResult<()>;
    /// Stop without finishing the output. Called on error and cancellation paths.
    fn abort(&mut self) {}
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(u64, Vec<u8>)>,
    ended: bool,
    aborted: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Captured frames in push order.
    pub fn frames(&self) -> &[(u64, Vec<u8>)] {
        &self.frames
    }

    /// Return `true` once `end` was called.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Return `true` once `abort` was called.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ClipreelResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: u64, frame: &[u8]) -> ClipreelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ClipreelError::evaluation("in-memory sink not started"))?;
        if frame.len() != cfg.frame_len() {
            return Err(ClipreelError::validation(format!(
                "frame has {} bytes, expected {}",
                frame.len(),
                cfg.frame_len()
            )));
        }
        self.frames.push((idx, frame.to_vec()));
        Ok(())
    }

    fn end(&mut self) -> ClipreelResult<()> {
        self.ended = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}
