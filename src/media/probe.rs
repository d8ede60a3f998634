use serde::Deserialize;

use crate::foundation::error::{ClipreelError, ClipreelResult};

/// One stream entry as reported by `ffprobe -show_streams`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct StreamInfo {
    /// `video`, `audio`, ...
    #[serde(default)]
    pub codec_type: Option<String>,
    /// Codec short name.
    #[serde(default)]
    pub codec_name: Option<String>,
    /// Width in pixels (video).
    #[serde(default)]
    pub width: Option<u32>,
    /// Height in pixels (video).
    #[serde(default)]
    pub height: Option<u32>,
    /// Frame rate as `num/den`.
    #[serde(default)]
    pub r_frame_rate: Option<String>,
    /// Display rotation in degrees.
    #[serde(default)]
    pub rotation: Option<i32>,
}

/// Probe output for one media file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProbeResult {
    /// Container duration in seconds.
    pub duration: Option<f64>,
    /// Streams in file order.
    pub streams: Vec<StreamInfo>,
}

/// Video metadata needed for planning.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoInfo {
    /// Source duration in seconds.
    pub duration: f64,
    /// Display width (swapped for 90/270 rotation).
    pub width: u32,
    /// Display height (swapped for 90/270 rotation).
    pub height: u32,
    /// Frame rate string as reported (`num/den`).
    pub framerate_str: String,
    /// Display rotation in degrees.
    pub rotation: Option<i32>,
    /// Codec short name of the video stream.
    pub codec_name: Option<String>,
}

impl ProbeResult {
    /// Return `true` when the file has at least one audio stream.
    pub fn has_audio(&self) -> bool {
        self.streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("audio"))
    }

    /// Container duration, failing when unknown.
    pub fn require_duration(&self, path: &str) -> ClipreelResult<f64> {
        match self.duration {
            Some(d) if d.is_finite() && d >= 0.0 => Ok(d),
            _ => Err(ClipreelError::evaluation(format!(
                "could not read duration of '{path}'"
            ))),
        }
    }

    /// Metadata of the first video stream.
    pub fn video_info(&self, path: &str) -> ClipreelResult<VideoInfo> {
        let stream = self
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| {
                ClipreelError::validation(format!("could not find a video stream in '{path}'"))
            })?;
        let duration = self.require_duration(path)?;
        let w = stream
            .width
            .ok_or_else(|| ClipreelError::evaluation("missing video width from ffprobe"))?;
        let h = stream
            .height
            .ok_or_else(|| ClipreelError::evaluation("missing video height from ffprobe"))?;
        let rotated = matches!(stream.rotation.map(|r| r.rem_euclid(360)), Some(90 | 270));
        let (width, height) = if rotated { (h, w) } else { (w, h) };
        Ok(VideoInfo {
            duration,
            width,
            height,
            framerate_str: stream
                .r_frame_rate
                .clone()
                .unwrap_or_else(|| "25/1".to_owned()),
            rotation: stream.rotation,
            codec_name: stream.codec_name.clone(),
        })
    }
}

/// Stream metadata provider.
pub trait MediaProbe: Send + Sync {
    /// Probe `path` (file path or URL).
    fn probe(&self, path: &str) -> ClipreelResult<ProbeResult>;
}

/// [`MediaProbe`] backed by the system `ffprobe` binary.
#[derive(Clone, Debug)]
pub struct FfprobeProbe {
    ffprobe_path: String,
}

impl FfprobeProbe {
    /// Probe through the `ffprobe` executable at `ffprobe_path`.
    pub fn new(ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }
}

impl MediaProbe for FfprobeProbe {
    fn probe(&self, path: &str) -> ClipreelResult<ProbeResult> {
        let out = std::process::Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path)
            .output()
            .map_err(|e| ClipreelError::evaluation(format!("failed to run ffprobe: {e}")))?;
        if !out.status.success() {
            return Err(ClipreelError::evaluation(format!(
                "ffprobe failed for '{path}': {}",
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        parse_ffprobe_json(&out.stdout)
    }
}

/// Decode `ffprobe -print_format json -show_streams -show_format` output.
pub fn parse_ffprobe_json(bytes: &[u8]) -> ClipreelResult<ProbeResult> {
    #[derive(Deserialize)]
    struct RawTags {
        rotate: Option<String>,
    }
    #[derive(Deserialize)]
    struct RawSideData {
        rotation: Option<serde_json::Value>,
    }
    #[derive(Deserialize)]
    struct RawStream {
        codec_type: Option<String>,
        codec_name: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
        tags: Option<RawTags>,
        #[serde(default)]
        side_data_list: Vec<RawSideData>,
    }
    #[derive(Deserialize)]
    struct RawFormat {
        duration: Option<String>,
    }
    #[derive(Deserialize)]
    struct RawOut {
        #[serde(default)]
        streams: Vec<RawStream>,
        format: Option<RawFormat>,
    }

    let raw: RawOut = serde_json::from_slice(bytes)
        .map_err(|e| ClipreelError::evaluation(format!("ffprobe json parse failed: {e}")))?;

    let streams = raw
        .streams
        .into_iter()
        .map(|s| {
            let from_tag = s
                .tags
                .and_then(|t| t.rotate)
                .and_then(|r| r.trim().parse::<i32>().ok());
            let from_side = s.side_data_list.iter().find_map(|d| match &d.rotation {
                Some(serde_json::Value::Number(n)) => n.as_f64().map(|v| v.round() as i32),
                Some(serde_json::Value::String(v)) => v.trim().parse::<i32>().ok(),
                _ => None,
            });
            StreamInfo {
                codec_type: s.codec_type,
                codec_name: s.codec_name,
                width: s.width,
                height: s.height,
                r_frame_rate: s.r_frame_rate,
                rotation: from_tag.or(from_side),
            }
        })
        .collect();
    let duration = raw
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok());

    Ok(ProbeResult { duration, streams })
}

#[cfg(test)]
#[path = "../../tests/unit/media/probe.rs"]
mod tests;
