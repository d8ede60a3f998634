use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameGeometry};
use crate::foundation::error::{ClipreelError, ClipreelResult};
use crate::gpu::device::GpuDevice;
use crate::plan::planner::ProcessedClip;
use crate::render::timeline::{BoundaryFrames, clip_time, planned_frame_count};
use crate::source::frame::{FrameSource, FrameSourceFactory};
use crate::transition::blend::Blender;

/// Shared flag that asks a running [`RenderLoop`] to stop.
///
/// The loop checks it once per iteration and returns [`ClipreelError::Cancelled`].
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Return `true` once [`CancelFlag::cancel`] was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counters reported by [`RenderLoop::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames pushed to the sink.
    pub frames_written: u64,
    /// Frames produced by a transition blend.
    pub blended_frames: u64,
    /// Reads of the current clip that returned no frame.
    pub dropped_frames: u64,
    /// Reads of the next clip that returned no frame during an overlap.
    pub missing_to_frames: u64,
}

/// The current clip source and the lookahead source. Both are closed on drop.
#[derive(Default)]
struct LiveSources {
    current: Option<Box<dyn FrameSource>>,
    next: Option<Box<dyn FrameSource>>,
}

impl LiveSources {
    fn close_all(&mut self) {
        if let Some(mut s) = self.current.take() {
            s.close();
        }
        if let Some(mut s) = self.next.take() {
            s.close();
        }
    }
}

impl Drop for LiveSources {
    fn drop(&mut self) {
        self.close_all();
    }
}

/// Walks processed clips frame by frame and streams the result into a [`FrameSink`].
///
/// At most two frame sources are alive: the current clip and the clip after it. During the last
/// `safe` frames of a clip both are read, the current one first, and blended by the clip's
/// trailing transition.
pub struct RenderLoop<'a> {
    clips: &'a [ProcessedClip],
    geometry: FrameGeometry,
    fps: Fps,
    cancel: Option<CancelFlag>,
    device: Option<Arc<dyn GpuDevice>>,
}

impl<'a> RenderLoop<'a> {
    /// Render loop over `clips` at `fps`, producing frames of `geometry`.
    pub fn new(clips: &'a [ProcessedClip], geometry: FrameGeometry, fps: Fps) -> Self {
        Self {
            clips,
            geometry,
            fps,
            cancel: None,
            device: None,
        }
    }

    /// Stop with [`ClipreelError::Cancelled`] once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Blend on `device` instead of a fresh software device per boundary.
    pub fn with_device(mut self, device: Arc<dyn GpuDevice>) -> Self {
        self.device = Some(device);
        self
    }

    /// Frames this loop will write.
    pub fn planned_frames(&self) -> u64 {
        let spans: Vec<(f64, f64)> = self
            .clips
            .iter()
            .map(|c| (c.duration, c.transition.duration))
            .collect();
        planned_frame_count(self.fps.as_f64(), &spans)
    }

    /// Render every clip into `sink`, muxing `audio` when given.
    ///
    /// On failure or cancellation both frame sources are closed and the sink is aborted before
    /// the error is returned.
    #[tracing::instrument(
        skip_all,
        fields(clips = self.clips.len(), fps = %self.fps.framerate_str())
    )]
    pub fn run(
        &self,
        factory: &dyn FrameSourceFactory,
        sink: &mut dyn FrameSink,
        audio: Option<PathBuf>,
    ) -> ClipreelResult<RenderStats> {
        if self.clips.is_empty() {
            return Err(ClipreelError::validation("nothing to render: no clips"));
        }
        sink.begin(SinkConfig {
            width: self.geometry.width,
            height: self.geometry.height,
            fps: self.fps,
            audio,
        })?;
        tracing::info!(frames = self.planned_frames(), "render start");

        match self.drive(factory, sink) {
            Ok(stats) => {
                sink.end()?;
                tracing::info!(
                    frames = stats.frames_written,
                    blended = stats.blended_frames,
                    dropped = stats.dropped_frames,
                    "render finished"
                );
                Ok(stats)
            }
            Err(err) => {
                sink.abort();
                Err(err)
            }
        }
    }

    fn blender_for(&self, clip: &ProcessedClip) -> ClipreelResult<Blender> {
        match &self.device {
            Some(device) => clip
                .transition
                .create_blender_on(device.clone(), self.geometry),
            None => clip.transition.create_blender(self.geometry),
        }
    }

    fn drive(
        &self,
        factory: &dyn FrameSourceFactory,
        sink: &mut dyn FrameSink,
    ) -> ClipreelResult<RenderStats> {
        let clips = self.clips;
        let fps = self.fps.as_f64();

        let mut sources = LiveSources::default();
        sources.current = Some(factory.create(0, &clips[0])?);
        if let Some(next) = clips.get(1) {
            sources.next = Some(factory.create(1, next)?);
        }

        let mut stats = RenderStats::default();
        let mut from_id = 0usize;
        let mut from_frame_at = 0u64;
        let mut to_frame_at = 0u64;
        let mut last_frame: Option<Vec<u8>> = None;
        let mut blender: Option<Blender> = None;

        loop {
            if let Some(flag) = &self.cancel
                && flag.is_cancelled()
            {
                tracing::info!(frames = stats.frames_written, "render cancelled");
                return Err(ClipreelError::Cancelled);
            }

            let from_clip = &clips[from_id];
            let to_clip = clips.get(from_id + 1);
            let b = BoundaryFrames::new(
                fps,
                from_clip.duration,
                to_clip.map(|c| c.duration),
                from_clip.transition.duration,
            );

            if b.should_advance(from_frame_at) {
                from_id += 1;
                if from_id >= clips.len() {
                    break;
                }
                if let Some(mut done) = sources.current.take() {
                    done.close();
                }
                sources.current = sources.next.take();
                sources.next = match clips.get(from_id + 1) {
                    Some(c) => Some(factory.create(from_id + 1, c)?),
                    None => None,
                };
                blender = None;
                from_frame_at = b.safe_frames;
                to_frame_at = 0;
                tracing::info!(clip = from_id, start_frame = from_frame_at, "switch clip");
                continue;
            }

            let current = sources
                .current
                .as_mut()
                .ok_or_else(|| ClipreelError::evaluation("no frame source for current clip"))?;
            let time = clip_time(from_clip.duration, from_frame_at, b.from_frames);
            let frame1 = match current.read_next_frame(time)? {
                Some(frame) => frame,
                None => {
                    stats.dropped_frames += 1;
                    match last_frame.take() {
                        Some(prev) => {
                            tracing::warn!(clip = from_id, time, "no frame data, reusing last frame");
                            prev
                        }
                        None => {
                            tracing::warn!(clip = from_id, time, "no frame data, using blank frame");
                            vec![0u8; self.geometry.frame_len()]
                        }
                    }
                }
            };

            let mut in_transition = false;
            let mut blended: Option<Vec<u8>> = None;
            if let (Some(next), Some(to_clip)) = (sources.next.as_mut(), to_clip)
                && b.in_transition(from_frame_at)
            {
                in_transition = true;
                let to_time = clip_time(
                    to_clip.duration,
                    to_frame_at,
                    b.to_frames.unwrap_or_default(),
                );
                match next.read_next_frame(to_time)? {
                    Some(frame2) => {
                        if blender.is_none() {
                            blender = Some(self.blender_for(from_clip)?);
                        }
                        if let Some(bl) = &blender {
                            let progress = b.progress(from_frame_at);
                            tracing::debug!(clip = from_id, progress, "blend");
                            blended = Some(bl.blend(&frame1, &frame2, progress)?);
                            stats.blended_frames += 1;
                        }
                    }
                    None => {
                        stats.missing_to_frames += 1;
                        tracing::warn!(
                            clip = from_id + 1,
                            time = to_time,
                            "no frame data for next clip, passing current frame through"
                        );
                    }
                }
            }

            let out = blended.as_deref().unwrap_or(&frame1);
            sink.push_frame(stats.frames_written, out)?;

            stats.frames_written += 1;
            from_frame_at += 1;
            if in_transition {
                to_frame_at += 1;
            }
            last_frame = Some(frame1);
        }

        sources.close_all();
        Ok(stats)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/render_loop.rs"]
mod tests;
