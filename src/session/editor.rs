use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::audio::pipeline::{AudioOptions, AudioPipeline};
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, ensure_parent_dir};
use crate::encode::sink::FrameSink;
use crate::foundation::core::{Canvas, Fps, FrameGeometry};
use crate::foundation::error::{ClipreelError, ClipreelResult};
use crate::media::ffmpeg::{FfmpegRunner, SystemFfmpeg};
use crate::media::probe::{FfprobeProbe, MediaProbe};
use crate::plan::fonts::FontRegistry;
use crate::plan::planner::{ClipPlanner, GlobalAudioConfig, PlanOutput};
use crate::render::render_loop::{CancelFlag, RenderLoop, RenderStats};
use crate::scene::config::RenderConfig;
use crate::session::output::{OutputRequest, first_video, output_canvas, output_fps};
use crate::source::clip::ClipSourceFactory;
use crate::source::frame::FrameSourceFactory;

/// Canvas of a single-frame render without an explicit size.
pub const SINGLE_FRAME_CANVAS: Canvas = Canvas {
    width: 800,
    height: 600,
};

/// Summary of a finished render.
#[derive(Clone, Debug)]
pub struct RenderReport {
    /// Written file.
    pub out_path: PathBuf,
    /// Output canvas.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// An audio track was muxed.
    pub has_audio: bool,
    /// Render loop counters.
    pub stats: RenderStats,
}

/// Scratch directory removed on drop unless kept for debugging.
struct TempDirGuard {
    path: PathBuf,
    keep: bool,
}

impl TempDirGuard {
    fn create(out_dir: &Path, seed: &Path, keep: bool) -> ClipreelResult<Self> {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let key = format!("{}:{}:{nanos}", seed.display(), std::process::id());
        let hash = xxhash_rust::xxh3::xxh3_64(key.as_bytes());
        let path = out_dir.join(format!("clipreel-tmp-{hash:016x}"));
        std::fs::create_dir_all(&path)
            .with_context(|| format!("create temp dir '{}'", path.display()))?;
        tracing::debug!(tmp = %path.display(), "created temp dir");
        Ok(Self { path, keep })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        if self.keep {
            tracing::info!(tmp = %self.path.display(), "keeping temp dir");
            return;
        }
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Renders one [`RenderConfig`] end to end.
pub struct Editor {
    config: RenderConfig,
    probe: Arc<dyn MediaProbe>,
    runner: Arc<dyn FfmpegRunner>,
    fonts: Arc<FontRegistry>,
    cancel: Option<CancelFlag>,
}

impl Editor {
    /// Editor using the configured `ffprobe`/`ffmpeg` binaries and system fonts.
    pub fn new(config: RenderConfig) -> Self {
        let probe = Arc::new(FfprobeProbe::new(config.ffprobe_path.clone()));
        let runner = Arc::new(SystemFfmpeg::new(config.ffmpeg_path.clone()));
        Self {
            config,
            probe,
            runner,
            fonts: Arc::new(FontRegistry::new()),
            cancel: None,
        }
    }

    /// Replace the media probe.
    pub fn with_probe(mut self, probe: Arc<dyn MediaProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Replace the runner used by the audio pipeline.
    pub fn with_runner(mut self, runner: Arc<dyn FfmpegRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Replace the font registry.
    pub fn with_fonts(mut self, fonts: Arc<FontRegistry>) -> Self {
        self.fonts = fonts;
        self
    }

    /// Stop the render loop once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// The config being rendered.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Validate and plan the timeline.
    pub fn plan(&self) -> ClipreelResult<PlanOutput> {
        self.config.validate()?;
        ClipPlanner::new(self.probe.clone(), self.fonts.clone(), self.config.seed)
            .with_remote_requests(self.config.allow_remote_requests)
            .plan(
                &self.config.clips,
                &self.config.defaults,
                &GlobalAudioConfig::from_config(&self.config),
            )
    }

    fn output_request(&self) -> OutputRequest {
        OutputRequest {
            width: self.config.width,
            height: self.config.height,
            fps: self.config.fps,
            fast: self.config.fast,
            gif: self.config.is_gif(),
        }
    }

    fn source_factory(&self, canvas: Canvas, fps: Fps) -> ClipSourceFactory {
        ClipSourceFactory::new(
            FrameGeometry::rgba(canvas),
            fps.framerate_str(),
            self.fonts.clone(),
            self.config.ffmpeg_path.clone(),
            self.config.enable_ffmpeg_log,
        )
    }

    /// Render to the configured output file through `ffmpeg`.
    pub fn render(&self) -> ClipreelResult<RenderReport> {
        let mut opts = FfmpegSinkOpts::new(self.config.out_path.clone());
        opts.ffmpeg_path = self.config.ffmpeg_path.clone();
        opts.custom_output_args = self.config.custom_output_args.clone();
        opts.fast = self.config.fast;
        opts.enable_ffmpeg_log = self.config.enable_ffmpeg_log;
        let mut sink = FfmpegSink::new(opts);
        self.render_into(&mut sink)
    }

    /// Plan, build the audio track and stream every frame into `sink`.
    pub fn render_into(&self, sink: &mut dyn FrameSink) -> ClipreelResult<RenderReport> {
        let plan = self.plan()?;
        let req = self.output_request();
        let video = first_video(&plan.clips);
        let canvas = output_canvas(&req, video);
        let fps = output_fps(&req, video)?;
        tracing::info!(
            width = canvas.width,
            height = canvas.height,
            fps = %fps.framerate_str(),
            duration = plan.total_duration(),
            "planned"
        );

        ensure_parent_dir(&self.config.out_path)?;
        let tmp = TempDirGuard::create(
            &self.config.out_dir(),
            &self.config.out_path,
            self.config.keep_tmp,
        )?;

        let audio = AudioPipeline::new(
            self.runner.clone(),
            self.probe.clone(),
            tmp.path().to_path_buf(),
        )
        .with_ffmpeg_log(self.config.enable_ffmpeg_log)
        .edit_audio(
            &plan.clips,
            &plan.arbitrary_audio,
            &AudioOptions {
                keep_source_audio: self.config.keep_source_audio,
                clips_audio_volume: self.config.clips_audio_volume,
                audio_norm: self.config.audio_norm,
                output_volume: self.config.output_volume.clone(),
                no_audio_output: req.gif,
            },
        )?;
        let has_audio = audio.is_some();

        let factory = self.source_factory(canvas, fps);
        let mut render_loop = RenderLoop::new(&plan.clips, FrameGeometry::rgba(canvas), fps);
        if let Some(flag) = &self.cancel {
            render_loop = render_loop.with_cancel_flag(flag.clone());
        }
        let stats = render_loop.run(&factory, sink, audio)?;

        Ok(RenderReport {
            out_path: self.config.out_path.clone(),
            canvas,
            fps,
            has_audio,
            stats,
        })
    }

    /// Render the frame at `time` seconds to a PNG file.
    ///
    /// The clip is found by plain cumulative durations, without transition overlaps.
    pub fn render_single_frame(&self, time: f64, out_png: &Path) -> ClipreelResult<()> {
        let plan = self.plan()?;
        let canvas = match (self.config.width, self.config.height) {
            (Some(width), Some(height)) if width > 0 && height > 0 => Canvas { width, height },
            _ => SINGLE_FRAME_CANVAS,
        };
        let (index, clip_time) = clip_at(&plan, time).ok_or_else(|| {
            ClipreelError::validation(format!("no clip found at requested time {time}"))
        })?;

        let factory = self.source_factory(canvas, Fps::whole(1)?);
        let mut source = factory.create(index, &plan.clips[index])?;
        let frame = source.read_next_frame(clip_time);
        source.close();
        let frame = frame?.ok_or_else(|| {
            ClipreelError::evaluation(format!("clip {index} produced no frame at {clip_time}s"))
        })?;

        write_png(out_png, canvas, frame)?;
        tracing::info!(out = %out_png.display(), clip = index, "wrote frame");
        Ok(())
    }
}

/// Index of the clip covering `time` and the time inside it.
pub fn clip_at(plan: &PlanOutput, time: f64) -> Option<(usize, f64)> {
    let mut start = 0.0;
    for (i, clip) in plan.clips.iter().enumerate() {
        if time >= start && time < start + clip.duration {
            return Some((i, time - start));
        }
        start += clip.duration;
    }
    None
}

fn write_png(path: &Path, canvas: Canvas, mut premul: Vec<u8>) -> ClipreelResult<()> {
    for px in premul.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
    let img = image::RgbaImage::from_raw(canvas.width, canvas.height, premul)
        .ok_or_else(|| ClipreelError::evaluation("frame does not match the canvas size"))?;
    ensure_parent_dir(path)?;
    img.save(path)
        .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/session/editor.rs"]
mod tests;
