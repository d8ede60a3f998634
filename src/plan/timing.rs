//! Pure timeline arithmetic shared by the planner, the render loop and the audio pipeline.

use crate::foundation::error::{ClipreelError, ClipreelResult};

/// Slack for window comparisons against float clip durations.
const WINDOW_EPSILON: f64 = 1e-9;

/// A layer's resolved window inside its clip, in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerWindow {
    /// Window start.
    pub start: f64,
    /// Window stop.
    pub stop: f64,
    /// `stop - start`.
    pub duration: f64,
}

impl LayerWindow {
    /// Return `true` when the window covers the whole clip.
    pub fn spans(&self, clip_duration: f64) -> bool {
        self.start <= WINDOW_EPSILON && (self.stop - clip_duration).abs() <= WINDOW_EPSILON
    }
}

/// Resolve `start`/`stop` against the clip. The window must lie inside `[0, clip_duration]`.
pub fn layer_window(
    start: Option<f64>,
    stop: Option<f64>,
    clip_duration: f64,
) -> ClipreelResult<LayerWindow> {
    let s = start.unwrap_or(0.0);
    let e = stop.unwrap_or(clip_duration);
    let duration = e - s;
    let inside = s.is_finite()
        && e.is_finite()
        && s >= 0.0
        && duration > 0.0
        && duration <= clip_duration + WINDOW_EPSILON
        && e <= clip_duration + WINDOW_EPSILON;
    if !inside {
        return Err(ClipreelError::validation(format!(
            "invalid start {s} or stop {e} (clip duration {clip_duration})"
        )));
    }
    Ok(LayerWindow {
        start: s,
        stop: e,
        duration,
    })
}

/// Clamp a video cut into `[0, file_duration]`. `cut_to` defaults to the end of the file.
pub fn clamp_video_cut(
    cut_from: Option<f64>,
    cut_to: Option<f64>,
    file_duration: f64,
) -> ClipreelResult<(f64, f64)> {
    let from = cut_from.unwrap_or(0.0).max(0.0).min(file_duration);
    let to = cut_to
        .filter(|t| *t > 0.0)
        .unwrap_or(file_duration)
        .max(from)
        .min(file_duration);
    if from >= to {
        return Err(ClipreelError::validation(format!(
            "cutFrom ({from}) must be lower than cutTo ({to})"
        )));
    }
    Ok((from, to))
}

/// Clamp an audio cut into `[0, file_duration]`. `cut_to` defaults to `cut_from + clip_duration`.
pub fn clamp_audio_cut(
    cut_from: Option<f64>,
    cut_to: Option<f64>,
    file_duration: f64,
    clip_duration: f64,
) -> ClipreelResult<(f64, f64)> {
    let from = cut_from.unwrap_or(0.0).max(0.0).min(file_duration);
    let to = cut_to
        .filter(|t| *t > 0.0)
        .unwrap_or(from + clip_duration)
        .max(from)
        .min(file_duration);
    if from >= to {
        return Err(ClipreelError::validation(format!(
            "cutFrom ({from}) must be lower than cutTo ({to})"
        )));
    }
    Ok((from, to))
}

/// Clamp each requested transition to half of both neighbouring clips.
///
/// The last clip has no neighbour and always gets `0`.
pub fn safe_transition_durations(durations: &[f64], requested: &[f64]) -> Vec<f64> {
    durations
        .iter()
        .enumerate()
        .map(|(i, d)| match durations.get(i + 1) {
            Some(next) => (d / 2.0)
                .min(next / 2.0)
                .min(requested.get(i).copied().unwrap_or(0.0))
                .max(0.0),
            None => 0.0,
        })
        .collect()
}

/// Absolute start of every clip: the running sum of `duration - safe_transition`.
pub fn clip_offsets(durations: &[f64], safe: &[f64]) -> Vec<f64> {
    let mut total = 0.0;
    durations
        .iter()
        .zip(safe)
        .map(|(d, t)| {
            let start = total;
            total += d - t;
            start
        })
        .collect()
}

/// Output duration of the whole timeline.
pub fn total_duration(durations: &[f64], safe: &[f64]) -> f64 {
    durations.iter().zip(safe).map(|(d, t)| d - t).sum()
}

#[cfg(test)]
#[path = "../../tests/unit/plan/timing.rs"]
mod tests;
