use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::foundation::error::{ClipreelError, ClipreelResult};
use crate::scene::model::{AudioNorm, AudioTrack, ClipDef, Defaults, OutputVolume};

/// Full render request: the timeline plus output and audio options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderConfig {
    /// Output file. A `.gif` extension selects the GIF pipeline.
    pub out_path: PathBuf,
    /// Ordered clips.
    pub clips: Vec<ClipDef>,
    /// Requested output width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Requested output height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Requested output frame rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    /// Encoder output arguments replacing the built-in codec set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_output_args: Option<Vec<String>>,
    /// Allow `http(s)://` media paths.
    #[serde(default)]
    pub allow_remote_requests: bool,
    /// Low resolution, low frame rate preview.
    #[serde(default)]
    pub fast: bool,
    /// Defaults for clips, layers and transitions.
    #[serde(default)]
    pub defaults: Defaults,
    /// Extra tracks mixed over the clip audio.
    #[serde(default)]
    pub audio_tracks: Vec<AudioTrack>,
    /// Background track.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_file_path: Option<String>,
    /// Mix weight of the background track.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_audio_volume: Option<f64>,
    /// Loop the background track.
    #[serde(default)]
    pub loop_audio: bool,
    /// Keep audio from video and audio layers.
    #[serde(default)]
    pub keep_source_audio: bool,
    /// Mix weight of the concatenated clip audio.
    #[serde(default = "RenderConfig::default_clips_audio_volume")]
    pub clips_audio_volume: f64,
    /// Gain applied after the final mix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_volume: Option<OutputVolume>,
    /// Loudness normalization of the final mix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_norm: Option<AudioNorm>,
    /// Keep the temporary working directory.
    #[serde(default)]
    pub keep_tmp: bool,
    /// Per-frame debug logging.
    #[serde(default)]
    pub verbose: bool,
    /// Let ffmpeg print its own log.
    #[serde(default)]
    pub enable_ffmpeg_log: bool,
    /// ffmpeg executable.
    #[serde(default = "RenderConfig::default_ffmpeg_path")]
    pub ffmpeg_path: String,
    /// ffprobe executable.
    #[serde(default = "RenderConfig::default_ffprobe_path")]
    pub ffprobe_path: String,
    /// Seed for random transitions and colors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl RenderConfig {
    fn default_clips_audio_volume() -> f64 {
        1.0
    }

    fn default_ffmpeg_path() -> String {
        "ffmpeg".to_owned()
    }

    fn default_ffprobe_path() -> String {
        "ffprobe".to_owned()
    }

    /// Config writing to `out_path` with every option at its default.
    pub fn new(out_path: impl Into<PathBuf>, clips: Vec<ClipDef>) -> Self {
        Self {
            out_path: out_path.into(),
            clips,
            width: None,
            height: None,
            fps: None,
            custom_output_args: None,
            allow_remote_requests: false,
            fast: false,
            defaults: Defaults::default(),
            audio_tracks: Vec::new(),
            audio_file_path: None,
            background_audio_volume: None,
            loop_audio: false,
            keep_source_audio: false,
            clips_audio_volume: Self::default_clips_audio_volume(),
            output_volume: None,
            audio_norm: None,
            keep_tmp: false,
            verbose: false,
            enable_ffmpeg_log: false,
            ffmpeg_path: Self::default_ffmpeg_path(),
            ffprobe_path: Self::default_ffprobe_path(),
            seed: None,
        }
    }

    /// Parse a config from a JSON string.
    pub fn from_json_str(s: &str) -> ClipreelResult<Self> {
        let value: serde_json::Value = serde_json::from_str(s)
            .map_err(|e| ClipreelError::serde(format!("parse config JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Parse a config from a JSON reader.
    pub fn from_reader<R: Read>(r: R) -> ClipreelResult<Self> {
        let value: serde_json::Value = serde_json::from_reader(r)
            .map_err(|e| ClipreelError::serde(format!("parse config JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Parse a config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ClipreelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ClipreelError::validation(format!("open config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    fn from_value(mut value: serde_json::Value) -> ClipreelResult<Self> {
        normalize_document(&mut value)?;
        let cfg: RenderConfig = serde_json::from_value(value)
            .map_err(|e| ClipreelError::serde(format!("decode config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the document-level shape rules.
    pub fn validate(&self) -> ClipreelResult<()> {
        if self.out_path.as_os_str().is_empty() {
            return Err(ClipreelError::validation("please provide an output path"));
        }
        if self.clips.is_empty() {
            return Err(ClipreelError::validation("please provide at least 1 clip"));
        }
        for (i, clip) in self.clips.iter().enumerate() {
            if clip.layers.is_empty() {
                return Err(ClipreelError::validation(format!(
                    "clip {i}: \"layers\" must contain one or more layers"
                )));
            }
        }
        if let Some(fps) = self.fps
            && !(fps.is_finite() && fps > 0.0)
        {
            return Err(ClipreelError::validation(format!("fps must be > 0, got {fps}")));
        }
        Ok(())
    }

    /// Return `true` when the output is an animated GIF.
    pub fn is_gif(&self) -> bool {
        self.out_path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("gif"))
    }

    /// Directory that will hold the output file.
    pub fn out_dir(&self) -> PathBuf {
        match self.out_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

const LAYER_TYPES: &[&str] = &[
    "video",
    "audio",
    "detached-audio",
    "image",
    "image-overlay",
    "title",
    "subtitle",
    "news-title",
    "slide-in-text",
    "fill-color",
    "linear-gradient",
    "radial-gradient",
    "gl",
    "pause",
    "rainbow-colors",
    "title-background",
    "editly-banner",
];

/// Shape fixes and checks that must run before typed decoding, so errors can name the clip.
fn normalize_document(value: &mut serde_json::Value) -> ClipreelResult<()> {
    let Some(root) = value.as_object_mut() else {
        return Err(ClipreelError::validation("config must be a JSON object"));
    };
    match root.get("outPath") {
        Some(serde_json::Value::String(s)) if !s.is_empty() => {}
        _ => return Err(ClipreelError::validation("please provide an output path")),
    }
    let Some(clips) = root.get_mut("clips").and_then(|c| c.as_array_mut()) else {
        return Err(ClipreelError::validation("please provide at least 1 clip"));
    };
    if clips.is_empty() {
        return Err(ClipreelError::validation("please provide at least 1 clip"));
    }
    for (ci, clip) in clips.iter_mut().enumerate() {
        let Some(clip) = clip.as_object_mut() else {
            return Err(ClipreelError::validation(format!(
                "clip {ci}: \"clips\" must contain objects with one or more layers"
            )));
        };
        let layers = clip
            .entry("layers")
            .or_insert_with(|| serde_json::Value::Array(Vec::new()));
        if layers.is_object() {
            let single = layers.take();
            *layers = serde_json::Value::Array(vec![single]);
        }
        let Some(layers) = layers.as_array() else {
            return Err(ClipreelError::validation(format!(
                "clip {ci}: \"layers\" must contain one or more objects"
            )));
        };
        if layers.is_empty() {
            return Err(ClipreelError::validation(format!(
                "clip {ci}: \"layers\" must contain one or more layers"
            )));
        }
        for (li, layer) in layers.iter().enumerate() {
            let Some(obj) = layer.as_object() else {
                return Err(ClipreelError::validation(format!(
                    "clip {ci} layer {li}: layers must be objects"
                )));
            };
            match obj.get("type") {
                Some(serde_json::Value::String(t)) if LAYER_TYPES.contains(&t.as_str()) => {}
                Some(serde_json::Value::String(t)) => {
                    return Err(ClipreelError::validation(format!(
                        "clip {ci} layer {li}: invalid layer type {t}"
                    )));
                }
                _ => {
                    return Err(ClipreelError::validation(format!(
                        "clip {ci} layer {li}: all layers must have a type"
                    )));
                }
            }
        }
        if let Some(t) = clip.get("transition")
            && !(t.is_null() || t.is_object())
        {
            return Err(ClipreelError::validation(format!(
                "clip {ci}: invalid transition {t}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/scene/config.rs"]
mod tests;
