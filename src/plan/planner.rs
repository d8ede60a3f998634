use std::sync::Arc;

use rayon::prelude::*;

use crate::foundation::core::{IO_CONCURRENCY, build_thread_pool};
use crate::foundation::error::{ClipreelError, ClipreelResult};
use crate::media::path::assert_file_valid;
use crate::media::probe::{MediaProbe, VideoInfo};
use crate::plan::aliases::expand_aliases;
use crate::plan::colors::{random_color, random_gradient};
use crate::plan::defaults::apply_layer_defaults;
use crate::plan::fonts::FontRegistry;
use crate::plan::timing::{
    LayerWindow, clamp_audio_cut, clamp_video_cut, clip_offsets, layer_window,
    safe_transition_durations,
};
use crate::scene::config::RenderConfig;
use crate::scene::layer::{Layer, LayerKind};
use crate::scene::model::{AudioTrack, ClipDef, Defaults, TransitionSpec};
use crate::source::gl;
use crate::transition::resolve::ResolvedTransition;

/// A layer after planning: defaults merged, window resolved, media probed.
#[derive(Clone, Debug)]
pub struct ProcessedLayer {
    /// Concrete layer content (never an alias kind).
    pub kind: LayerKind,
    /// Window inside the clip.
    pub window: LayerWindow,
    /// Source seconds consumed per output second (`video` and `audio`).
    pub speed_factor: f64,
    /// Clamped `(cutFrom, cutTo)` for `video` and `audio`.
    pub cut: Option<(f64, f64)>,
    /// Probe result for `video`.
    pub media: Option<VideoInfo>,
}

impl ProcessedLayer {
    /// Mix weight of a `video` or `audio` layer.
    pub fn mix_volume(&self) -> f64 {
        match &self.kind {
            LayerKind::Video(v) => v.mix_volume.unwrap_or(1.0),
            LayerKind::Audio(a) => a.mix_volume.unwrap_or(1.0),
            _ => 1.0,
        }
    }

    /// Source path of a media layer.
    pub fn media_path(&self) -> Option<&str> {
        match &self.kind {
            LayerKind::Video(v) => Some(&v.path),
            LayerKind::Audio(a) => Some(&a.path),
            _ => None,
        }
    }
}

/// A clip after planning. The transition duration is already the safe duration.
#[derive(Clone, Debug)]
pub struct ProcessedClip {
    /// Visual and clip-audio layers, bottom first. Detached audio is removed.
    pub layers: Vec<ProcessedLayer>,
    /// Final duration in seconds.
    pub duration: f64,
    /// Trailing transition.
    pub transition: ResolvedTransition,
}

/// Planner result consumed by the render loop and the audio pipeline.
#[derive(Clone, Debug)]
pub struct PlanOutput {
    /// Clips in timeline order.
    pub clips: Vec<ProcessedClip>,
    /// Background, user and detached tracks with absolute offsets.
    pub arbitrary_audio: Vec<AudioTrack>,
}

impl PlanOutput {
    /// Output timeline length in seconds.
    pub fn total_duration(&self) -> f64 {
        self.clips
            .iter()
            .map(|c| c.duration - c.transition.duration)
            .sum()
    }
}

/// Audio options that are not attached to any clip.
#[derive(Clone, Debug, Default)]
pub struct GlobalAudioConfig {
    /// Background track.
    pub background_audio_path: Option<String>,
    /// Background mix weight (default 1).
    pub background_audio_volume: Option<f64>,
    /// Loop the background track forever.
    pub loop_audio: bool,
    /// User tracks.
    pub audio_tracks: Vec<AudioTrack>,
}

impl GlobalAudioConfig {
    /// Audio options of a render config.
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            background_audio_path: config.audio_file_path.clone(),
            background_audio_volume: config.background_audio_volume,
            loop_audio: config.loop_audio,
            audio_tracks: config.audio_tracks.clone(),
        }
    }
}

struct DetachedAudio {
    relative_start: f64,
    track: AudioTrack,
}

struct FirstPass {
    clip: ProcessedClip,
    detached: Vec<DetachedAudio>,
}

/// Turns clip definitions into [`ProcessedClip`]s and the arbitrary audio list.
pub struct ClipPlanner {
    probe: Arc<dyn MediaProbe>,
    fonts: Arc<FontRegistry>,
    seed: u64,
    allow_remote_requests: bool,
    threads: usize,
}

impl std::fmt::Debug for ClipPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipPlanner")
            .field("seed", &self.seed)
            .field("allow_remote_requests", &self.allow_remote_requests)
            .field("threads", &self.threads)
            .finish_non_exhaustive()
    }
}

fn at_clip(ci: usize) -> impl Fn(ClipreelError) -> ClipreelError {
    move |e| match e {
        ClipreelError::Validation(m) => ClipreelError::validation(format!("clip {ci}: {m}")),
        other => other,
    }
}

fn at_layer(ci: usize, li: usize) -> impl Fn(ClipreelError) -> ClipreelError {
    move |e| match e {
        ClipreelError::Validation(m) => {
            ClipreelError::validation(format!("clip {ci} layer {li}: {m}"))
        }
        other => other,
    }
}

impl ClipPlanner {
    /// Planner probing media through `probe` and registering fonts in `fonts`.
    ///
    /// Without a seed, random transitions and colors differ between runs.
    pub fn new(probe: Arc<dyn MediaProbe>, fonts: Arc<FontRegistry>, seed: Option<u64>) -> Self {
        Self {
            probe,
            fonts,
            seed: seed.unwrap_or_else(|| fastrand::u64(..)),
            allow_remote_requests: false,
            threads: IO_CONCURRENCY,
        }
    }

    /// Accept `http(s)://` media paths.
    pub fn with_remote_requests(mut self, allow: bool) -> Self {
        self.allow_remote_requests = allow;
        self
    }

    /// Worker count of the per-clip pool.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Plan the whole timeline.
    ///
    /// Clips are prepared independently on a bounded pool, then one sequential pass clamps
    /// transitions and places detached audio on the absolute timeline.
    #[tracing::instrument(skip_all, fields(clips = clips.len()))]
    pub fn plan(
        &self,
        clips: &[ClipDef],
        defaults: &Defaults,
        audio: &GlobalAudioConfig,
    ) -> ClipreelResult<PlanOutput> {
        if clips.is_empty() {
            return Err(ClipreelError::validation("please provide at least 1 clip"));
        }
        let last = clips.len() - 1;
        let pool = build_thread_pool(Some(self.threads))?;
        let first: Vec<FirstPass> = pool.install(|| {
            clips
                .par_iter()
                .enumerate()
                .map(|(ci, clip)| self.plan_clip(ci, clip, ci == last, defaults))
                .collect::<ClipreelResult<Vec<_>>>()
        })?;

        let durations: Vec<f64> = first.iter().map(|p| p.clip.duration).collect();
        let requested: Vec<f64> = first.iter().map(|p| p.clip.transition.duration).collect();
        let safe = safe_transition_durations(&durations, &requested);
        let offsets = clip_offsets(&durations, &safe);

        let mut out_clips = Vec::with_capacity(first.len());
        let mut detached_tracks = Vec::new();
        for (i, pass) in first.into_iter().enumerate() {
            let FirstPass { mut clip, detached } = pass;
            if clip.transition.duration != safe[i] {
                tracing::debug!(
                    clip = i,
                    requested = clip.transition.duration,
                    safe = safe[i],
                    "clamped transition"
                );
            }
            clip.transition.duration = safe[i];
            for d in detached {
                let mut track = d.track;
                track.start = Some(offsets[i] + d.relative_start);
                detached_tracks.push(track);
            }
            out_clips.push(clip);
        }

        let mut arbitrary_audio = Vec::new();
        if let Some(path) = &audio.background_audio_path {
            arbitrary_audio.push(AudioTrack {
                mix_volume: Some(audio.background_audio_volume.unwrap_or(1.0)),
                loop_count: Some(if audio.loop_audio { -1 } else { 0 }),
                ..AudioTrack::new(path.clone())
            });
        }
        arbitrary_audio.extend(audio.audio_tracks.iter().cloned());
        arbitrary_audio.extend(detached_tracks);
        for track in &arbitrary_audio {
            validate_audio_track(track, self.allow_remote_requests)?;
        }

        let out = PlanOutput {
            clips: out_clips,
            arbitrary_audio,
        };
        tracing::info!(
            clips = out.clips.len(),
            duration = out.total_duration(),
            arbitrary_audio = out.arbitrary_audio.len(),
            "planned timeline"
        );
        Ok(out)
    }

    fn clip_rng(&self, ci: usize) -> fastrand::Rng {
        let salt = (ci as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        fastrand::Rng::with_seed(self.seed ^ salt)
    }

    fn plan_clip(
        &self,
        ci: usize,
        clip: &ClipDef,
        is_last: bool,
        defaults: &Defaults,
    ) -> ClipreelResult<FirstPass> {
        if clip.layers.is_empty() {
            return Err(ClipreelError::validation(format!(
                "clip {ci}: \"layers\" must contain one or more layers"
            )));
        }
        let mut rng = self.clip_rng(ci);

        let spec = merged_transition(defaults, clip);
        let transition =
            ResolvedTransition::resolve(spec.as_ref(), is_last, &mut rng).map_err(at_clip(ci))?;

        let mut prepared: Vec<(usize, Layer, Option<VideoInfo>)> = Vec::new();
        for (li, layer) in clip.layers.iter().enumerate() {
            let expanded = expand_aliases(layer.clone(), &mut rng).map_err(at_layer(ci, li))?;
            for mut l in expanded {
                apply_layer_defaults(&mut l.kind, defaults);
                let media = self
                    .prepare_layer(&mut l.kind, &mut rng)
                    .map_err(at_layer(ci, li))?;
                prepared.push((li, l, media));
            }
        }

        let user_duration = clip.duration.filter(|d| *d > 0.0);
        let video_duration = prepared.iter().find_map(|(_, l, _)| match &l.kind {
            LayerKind::Video(v) => match (v.cut_from, v.cut_to) {
                (Some(from), Some(to)) => Some(to - from),
                _ => None,
            },
            _ => None,
        });
        let duration = user_duration
            .or(video_duration)
            .or(defaults.duration.filter(|d| *d > 0.0))
            .ok_or_else(|| {
                ClipreelError::validation(format!(
                    "clip {ci}: duration parameter is required for videoless clip {ci}"
                ))
            })?;
        if !duration.is_finite() {
            return Err(ClipreelError::validation(format!(
                "clip {ci}: duration must be finite"
            )));
        }

        let mut layers = Vec::with_capacity(prepared.len());
        let mut detached = Vec::new();
        for (li, layer, media) in prepared {
            let Layer { start, stop, kind } = layer;
            let window = layer_window(start, stop, duration).map_err(at_layer(ci, li))?;
            match kind {
                LayerKind::DetachedAudio(a) => detached.push(DetachedAudio {
                    relative_start: window.start,
                    track: AudioTrack {
                        mix_volume: a.mix_volume,
                        cut_from: a.cut_from,
                        cut_to: a.cut_to,
                        ..AudioTrack::new(a.path)
                    },
                }),
                LayerKind::Audio(mut a) => {
                    assert_file_valid(&a.path, self.allow_remote_requests)
                        .map_err(at_layer(ci, li))?;
                    let file_duration = self.probe.probe(&a.path)?.require_duration(&a.path)?;
                    let (from, to) = clamp_audio_cut(a.cut_from, a.cut_to, file_duration, duration)
                        .map_err(at_layer(ci, li))?;
                    a.cut_from = Some(from);
                    a.cut_to = Some(to);
                    layers.push(ProcessedLayer {
                        kind: LayerKind::Audio(a),
                        window,
                        speed_factor: duration / (to - from),
                        cut: Some((from, to)),
                        media: None,
                    });
                }
                LayerKind::Video(v) => {
                    let (from, to) = v.cut_from.zip(v.cut_to).ok_or_else(|| {
                        ClipreelError::evaluation("video layer was not probed")
                    })?;
                    let speed_factor = match user_duration {
                        Some(d) => d / (to - from),
                        None => 1.0,
                    };
                    layers.push(ProcessedLayer {
                        kind: LayerKind::Video(v),
                        window,
                        speed_factor,
                        cut: Some((from, to)),
                        media,
                    });
                }
                kind => layers.push(ProcessedLayer {
                    kind,
                    window,
                    speed_factor: 1.0,
                    cut: None,
                    media: None,
                }),
            }
        }

        tracing::debug!(
            clip = ci,
            duration,
            layers = layers.len(),
            transition = transition.name.as_deref().unwrap_or("none"),
            "planned clip"
        );
        Ok(FirstPass {
            clip: ProcessedClip {
                layers,
                duration,
                transition,
            },
            detached,
        })
    }

    /// Validate one expanded layer, register its font, pick random colors and probe video.
    fn prepare_layer(
        &self,
        kind: &mut LayerKind,
        rng: &mut fastrand::Rng,
    ) -> ClipreelResult<Option<VideoInfo>> {
        match kind {
            LayerKind::Video(v) => {
                assert_file_valid(&v.path, self.allow_remote_requests)?;
                let info = self.probe.probe(&v.path)?.video_info(&v.path)?;
                let (from, to) = clamp_video_cut(v.cut_from, v.cut_to, info.duration)?;
                v.cut_from = Some(from);
                v.cut_to = Some(to);
                return Ok(Some(info));
            }
            LayerKind::Title(t) | LayerKind::Subtitle(t) => {
                self.prepare_text(&t.text, &t.font_path, &mut t.font_family)?
            }
            LayerKind::NewsTitle(t) => {
                self.prepare_text(&t.text, &t.font_path, &mut t.font_family)?
            }
            LayerKind::SlideInText(t) => {
                self.prepare_text(&t.text, &t.font_path, &mut t.font_family)?
            }
            LayerKind::Image(i) => assert_file_valid(&i.path, self.allow_remote_requests)?,
            LayerKind::ImageOverlay(i) => assert_file_valid(&i.path, self.allow_remote_requests)?,
            LayerKind::FillColor(f) => {
                if f.color.is_none() {
                    f.color = Some(random_color(rng));
                }
            }
            LayerKind::LinearGradient(g) | LayerKind::RadialGradient(g) => {
                if g.colors.is_none() {
                    g.colors = Some(random_gradient(rng));
                }
            }
            LayerKind::Gl(g) => {
                if let Some(path) = &g.fragment_path {
                    assert_file_valid(path, false)?;
                    return Err(ClipreelError::validation(format!(
                        "GLSL shader files are not supported ('{path}'), use a built-in \"shader\" ({})",
                        gl::program_names().join(", ")
                    )));
                }
                match g.shader.as_deref() {
                    Some(name) if gl::find_program(name).is_some() => {}
                    Some(name) => {
                        return Err(ClipreelError::validation(format!(
                            "unknown gl program: {name}"
                        )));
                    }
                    None => {
                        return Err(ClipreelError::validation(
                            "gl layer needs a \"shader\" name",
                        ));
                    }
                }
            }
            LayerKind::Audio(_) | LayerKind::DetachedAudio(_) => {}
            LayerKind::Pause(_)
            | LayerKind::RainbowColors
            | LayerKind::TitleBackground(_)
            | LayerKind::EditlyBanner(_) => {
                return Err(ClipreelError::evaluation(format!(
                    "alias layer '{}' survived expansion",
                    kind.type_name()
                )));
            }
        }
        Ok(None)
    }

    /// Require `text` and swap a registered `font_path` for its family name.
    fn prepare_text(
        &self,
        text: &str,
        font_path: &Option<String>,
        font_family: &mut Option<String>,
    ) -> ClipreelResult<()> {
        if text.trim().is_empty() {
            return Err(ClipreelError::validation("please specify a text"));
        }
        if let Some(path) = font_path {
            assert_file_valid(path, false)?;
            *font_family = Some(self.fonts.register(path)?);
        }
        Ok(())
    }
}

fn validate_audio_track(track: &AudioTrack, allow_remote_requests: bool) -> ClipreelResult<()> {
    let bad = |what: &str| {
        Err(ClipreelError::validation(format!(
            "audio track '{}': {what}",
            track.path
        )))
    };
    if let Some(from) = track.cut_from
        && (from.is_nan() || from < 0.0)
    {
        return bad("cutFrom must be >= 0");
    }
    if let Some(to) = track.cut_to {
        if to.is_nan() || to <= 0.0 {
            return bad("cutTo must be > 0");
        }
        if to <= track.cut_from.unwrap_or(0.0) {
            return bad("cutFrom must be lower than cutTo");
        }
    }
    if let Some(start) = track.start
        && (start.is_nan() || start < 0.0)
    {
        return bad("start must be >= 0");
    }
    assert_file_valid(&track.path, allow_remote_requests)
}

/// Transition request of `clip`: built-in defaults, then `defaults.transition`, then the clip's own.
///
/// A `null` clip transition is a hard cut. A `null` default only applies to clips without one.
pub fn merged_transition(defaults: &Defaults, clip: &ClipDef) -> Option<TransitionSpec> {
    match &clip.transition {
        None => defaults.effective_transition(),
        Some(None) => None,
        Some(Some(t)) => Some(
            defaults
                .effective_transition()
                .unwrap_or_default()
                .overlaid_with(t),
        ),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plan/planner.rs"]
mod tests;
