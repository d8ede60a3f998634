//! Declarative clip-timeline video rendering.
//!
//! A [`RenderConfig`] lists clips made of layers. [`ClipPlanner`] resolves durations, layer
//! windows and safe transition lengths, [`RenderLoop`] walks the planned clips frame by frame
//! (blending neighbours through [`Blender`]) into a [`FrameSink`], and [`AudioPipeline`]
//! assembles a matching audio track with ffmpeg. [`Editor`] runs the whole chain.
#![forbid(unsafe_code)]

mod audio;
mod encode;
mod foundation;
mod gpu;
mod media;
mod plan;
mod render;
mod scene;
mod session;
mod source;
mod transition;

pub use audio::graph::{
    Crossfade, MixOptions, MixStream, Tempo, amix_args, crossfade_args, crossfade_filter,
    extract_args, mix_args, mix_filter, silence_args,
};
pub use audio::pipeline::{AudioOptions, AudioPipeline, ClipAudio};
pub use encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, encoder_args, output_args};
pub use encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use foundation::core::{Canvas, Fps, FrameGeometry, IO_CONCURRENCY, RGBA_CHANNELS};
pub use foundation::error::{ClipreelError, ClipreelResult};
pub use gpu::device::{BufferId, GpuDevice, ProgramId};
pub use gpu::guard::{BufferGuard, ProgramGuard, TextureGuard};
pub use gpu::shader::{FragmentShader, TextureId, UniformKind, UniformValue};
pub use gpu::software::SoftwareDevice;
pub use media::ffmpeg::{FfmpegRunner, SystemFfmpeg, is_available};
pub use media::probe::{FfprobeProbe, MediaProbe, ProbeResult, StreamInfo, VideoInfo};
pub use plan::fonts::FontRegistry;
pub use plan::planner::{
    ClipPlanner, GlobalAudioConfig, PlanOutput, ProcessedClip, ProcessedLayer, merged_transition,
};
pub use plan::timing::{LayerWindow, clip_offsets, safe_transition_durations, total_duration};
pub use render::render_loop::{CancelFlag, RenderLoop, RenderStats};
pub use render::timeline::{BoundaryFrames, clip_time, planned_frame_count};
pub use scene::config::RenderConfig;
pub use scene::layer::{
    AudioLayer, BannerLayer, DetachedAudioLayer, FillColorLayer, GlLayer, GradientLayer,
    ImageLayer, ImageOverlayLayer, Layer, LayerDefaults, LayerKind, NewsTitleLayer, Placement,
    Position, ResizeMode, SlideInTextLayer, TextLayer, TitleBackgroundLayer, VideoLayer,
    ZoomDirection,
};
pub use scene::model::{AudioNorm, AudioTrack, ClipDef, Defaults, OutputVolume, TransitionSpec};
pub use session::editor::{Editor, RenderReport, clip_at};
pub use session::output::{OutputRequest, output_canvas, output_fps};
pub use source::clip::{ClipFrameSource, ClipSourceFactory};
pub use source::frame::{FrameSource, FrameSourceFactory, LayerSource};
pub use transition::blend::Blender;
pub use transition::ease::Easing;
pub use transition::resolve::ResolvedTransition;
