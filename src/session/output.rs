//! Output geometry and frame rate selection.

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ClipreelError, ClipreelResult};
use crate::media::probe::VideoInfo;
use crate::plan::planner::ProcessedClip;

/// Pixels per direction targeted by fast mode.
pub const FAST_PIXELS_EACH_DIRECTION: f64 = 250.0;
/// Frame rate of fast mode.
pub const FAST_FPS: u32 = 15;
/// Default GIF width.
pub const GIF_WIDTH: u32 = 320;
/// Default GIF frame rate.
pub const GIF_FPS: u32 = 10;
/// Default width (and height, when nothing is detected).
pub const DEFAULT_SIZE: u32 = 640;
/// Default frame rate.
pub const DEFAULT_FPS: u32 = 25;

/// What the user asked for, plus the output kind.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OutputRequest {
    /// Requested width.
    pub width: Option<u32>,
    /// Requested height.
    pub height: Option<u32>,
    /// Requested frame rate.
    pub fps: Option<f64>,
    /// Fast preview mode.
    pub fast: bool,
    /// GIF output.
    pub gif: bool,
}

/// Probe data of the first video layer in timeline order.
pub fn first_video(clips: &[ProcessedClip]) -> Option<&VideoInfo> {
    clips
        .iter()
        .flat_map(|c| c.layers.iter())
        .find_map(|l| l.media.as_ref())
}

fn multiple_of_2(x: u32) -> u32 {
    (x + x % 2).max(2)
}

/// Output canvas size.
///
/// User `width` + `height` win. A requested (or GIF) width keeps the first video's aspect
/// ratio. Without one the first video's own size is used, then a square default.
pub fn output_canvas(req: &OutputRequest, video: Option<&VideoInfo>) -> Canvas {
    let desired = match req.width {
        Some(w) if w > 0 => Some(w),
        _ if req.gif => Some(GIF_WIDTH),
        _ => None,
    };
    let (mut width, mut height) = match (video, desired) {
        (Some(v), Some(desired)) if v.width > 0 && v.height > 0 => {
            let h = (f64::from(v.height) / f64::from(v.width) * f64::from(desired)).round();
            (desired, (h as u32).max(1))
        }
        (Some(v), None) if v.width > 0 && v.height > 0 => (v.width, v.height),
        (_, Some(desired)) => (desired, desired),
        (_, None) => (DEFAULT_SIZE, DEFAULT_SIZE),
    };
    if let (Some(w), Some(h)) = (req.width, req.height)
        && w > 0
        && h > 0
    {
        width = w;
        height = h;
    }
    if req.fast {
        let aspect = (f64::from(width) / f64::from(height)).sqrt();
        width = (FAST_PIXELS_EACH_DIRECTION * aspect).round().max(1.0) as u32;
        height = (FAST_PIXELS_EACH_DIRECTION / aspect).round().max(1.0) as u32;
    }
    if !req.gif {
        width = multiple_of_2(width);
        height = multiple_of_2(height);
    }
    Canvas { width, height }
}

fn fps_from_f64(v: f64) -> ClipreelResult<Fps> {
    if v.fract() == 0.0 && v >= 1.0 && v <= f64::from(u32::MAX) {
        return Fps::whole(v as u32);
    }
    Fps::parse(&v.to_string())
        .ok_or_else(|| ClipreelError::validation(format!("invalid fps {v}")))
}

/// Output frame rate: fast, user, GIF, first video, then the default.
pub fn output_fps(req: &OutputRequest, video: Option<&VideoInfo>) -> ClipreelResult<Fps> {
    if req.fast {
        return Fps::whole(FAST_FPS);
    }
    if let Some(v) = req.fps {
        return fps_from_f64(v);
    }
    if req.gif {
        return Fps::whole(GIF_FPS);
    }
    if let Some(fps) = video.and_then(|v| Fps::parse(&v.framerate_str)) {
        return Ok(fps);
    }
    Fps::whole(DEFAULT_FPS)
}

#[cfg(test)]
#[path = "../../tests/unit/session/output.rs"]
mod tests;
