use crate::foundation::error::{ClipreelError, ClipreelResult};

/// Number of bytes per pixel in every frame buffer (RGBA8).
pub const RGBA_CHANNELS: u32 = 4;

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> ClipreelResult<Self> {
        if den == 0 {
            return Err(ClipreelError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ClipreelError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Whole-number frame rate.
    pub fn whole(num: u32) -> ClipreelResult<Self> {
        Self::new(num, 1)
    }

    /// Parse an ffmpeg-style frame rate string: `"25"`, `"30000/1001"` or `"29.97"`.
    ///
    /// Returns `None` for zero, negative or malformed rates.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some((num, den)) = s.split_once('/') {
            let num = num.trim().parse::<u32>().ok()?;
            let den = den.trim().parse::<u32>().ok()?;
            return Self::new(num, den).ok();
        }
        if let Ok(num) = s.parse::<u32>() {
            return Self::new(num, 1).ok();
        }
        let v = s.parse::<f64>().ok()?;
        if !v.is_finite() || v <= 0.0 {
            return None;
        }
        let num = (v * 1000.0).round();
        if num < 1.0 || num > f64::from(u32::MAX) {
            return None;
        }
        Self::new(num as u32, 1000).ok()
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Convert seconds to a frame count rounding to the nearest frame.
    pub fn secs_to_frames_round(self, secs: f64) -> u64 {
        (secs * self.as_f64()).round().max(0.0) as u64
    }

    /// String form accepted by ffmpeg's `-r` option.
    pub fn framerate_str(self) -> String {
        if self.den == 1 {
            self.num.to_string()
        } else {
            format!("{}/{}", self.num, self.den)
        }
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Pixel layout shared by frame sources, blenders and the encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameGeometry {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Bytes per pixel (always [`RGBA_CHANNELS`] for raw frames).
    pub channels: u32,
}

impl FrameGeometry {
    /// RGBA8 geometry for the given canvas.
    pub fn rgba(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            channels: RGBA_CHANNELS,
        }
    }

    /// Byte length of one frame.
    pub fn frame_len(self) -> usize {
        self.width as usize * self.height as usize * self.channels as usize
    }

    /// The canvas this geometry covers.
    pub fn canvas(self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }
}

/// Worker count for bounded I/O pools (probes, audio extraction).
pub const IO_CONCURRENCY: usize = 4;

pub(crate) fn build_thread_pool(threads: Option<usize>) -> ClipreelResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ClipreelError::evaluation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
