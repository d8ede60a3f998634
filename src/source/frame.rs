use crate::foundation::error::ClipreelResult;
use crate::plan::planner::ProcessedClip;

/// Produces the frames of one clip.
///
/// Frames are read in increasing `time` order. `None` means no frame is available for this call;
/// the caller decides how to degrade.
pub trait FrameSource: Send {
    /// Next frame at `time` seconds into the clip, as RGBA8 of the render geometry.
    fn read_next_frame(&mut self, time: f64) -> ClipreelResult<Option<Vec<u8>>>;

    /// Release decoders and subprocesses. Must be safe to call more than once.
    fn close(&mut self);
}

/// Opens one [`FrameSource`] per clip.
pub trait FrameSourceFactory {
    /// Frame source for `clip`, which is at `clip_index` in the timeline.
    fn create(&self, clip_index: usize, clip: &ProcessedClip)
    -> ClipreelResult<Box<dyn FrameSource>>;
}

/// Draws one layer onto a premultiplied clip canvas.
pub trait LayerSource: Send {
    /// Composite the layer at `progress` (0..=1 over its window), `time` seconds into its window.
    fn draw(&mut self, canvas: &mut [u8], progress: f64, time: f64) -> ClipreelResult<()>;

    /// Release resources held by the layer.
    fn close(&mut self) {}
}
