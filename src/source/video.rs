//! Video layers pulled from an ffmpeg child process as raw RGBA frames.

use std::io::{ErrorKind, Read};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::time::{Duration, Instant};

use crate::foundation::core::Canvas;
use crate::foundation::error::{ClipreelError, ClipreelResult};
use crate::foundation::math::premultiply_in_place;
use crate::media::ffmpeg::{common_args, secs_arg};
use crate::media::probe::VideoInfo;
use crate::scene::layer::{ResizeMode, VideoLayer};
use crate::source::frame::LayerSource;
use crate::source::raster::{DrawRect, PremulImage, blurred_cover, draw_image};

const KILL_GRACE: Duration = Duration::from_secs(1);
const KILL_POLL: Duration = Duration::from_millis(20);

/// How one video layer is decoded and placed.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoDecodePlan {
    /// ffmpeg arguments, excluding the binary.
    pub args: Vec<String>,
    /// Width of decoded frames.
    pub frame_width: u32,
    /// Height of decoded frames.
    pub frame_height: u32,
    /// Box the layer occupies on the canvas.
    pub requested: DrawRect,
    /// Where decoded frames are drawn.
    pub target: DrawRect,
    /// Resize mode in effect.
    pub resize_mode: ResizeMode,
}

impl VideoDecodePlan {
    /// Bytes of one decoded frame.
    pub fn frame_len(&self) -> usize {
        self.frame_width as usize * self.frame_height as usize * 4
    }
}

fn round_px(v: f64) -> u32 {
    v.round().max(1.0) as u32
}

/// Decode arguments and placement for `layer`.
///
/// `cut` is the clamped source range and `speed` the output-per-source time factor.
pub fn decode_plan(
    layer: &VideoLayer,
    info: &VideoInfo,
    cut: (f64, f64),
    speed: f64,
    canvas: Canvas,
    framerate_str: &str,
) -> ClipreelResult<VideoDecodePlan> {
    if info.width == 0 || info.height == 0 {
        return Err(ClipreelError::evaluation(format!(
            "video '{}' reports an empty frame size",
            layer.path
        )));
    }
    let cw = f64::from(canvas.width);
    let ch = f64::from(canvas.height);
    let req_w = layer.width.map_or(canvas.width, |rel| round_px(rel * cw));
    let req_h = layer.height.map_or(canvas.height, |rel| round_px(rel * ch));
    let left = layer.left.unwrap_or(0.0) * cw;
    let top = layer.top.unwrap_or(0.0) * ch;

    let ratio_w = f64::from(req_w) / f64::from(info.width);
    let ratio_h = f64::from(req_h) / f64::from(info.height);
    let aspect = f64::from(info.width) / f64::from(info.height);

    let resize_mode = layer.resize_mode.unwrap_or_default();
    let (frame_w, frame_h, scale_filter) = match resize_mode {
        ResizeMode::Contain | ResizeMode::ContainBlur => {
            let (w, h) = if ratio_w > ratio_h {
                (round_px(f64::from(req_h) * aspect), req_h)
            } else {
                (req_w, round_px(f64::from(req_w) / aspect))
            };
            (w, h, format!("scale={w}:{h}"))
        }
        ResizeMode::Cover => {
            let (sw, sh) = if ratio_w > ratio_h {
                (req_w, round_px(f64::from(req_w) / aspect))
            } else {
                (round_px(f64::from(req_h) * aspect), req_h)
            };
            (
                req_w,
                req_h,
                format!("scale={sw}:{sh},crop={req_w}:{req_h}"),
            )
        }
        ResizeMode::Stretch => (req_w, req_h, format!("scale={req_w}:{req_h}")),
    };

    let requested = DrawRect {
        x: left,
        y: top,
        w: f64::from(req_w),
        h: f64::from(req_h),
    };
    let target = DrawRect {
        x: left + (f64::from(req_w) - f64::from(frame_w)) / 2.0,
        y: top + (f64::from(req_h) - f64::from(frame_h)) / 2.0,
        w: f64::from(frame_w),
        h: f64::from(frame_h),
    };

    let pts_filter = if speed == 1.0 {
        String::new()
    } else {
        format!("setpts={speed}*PTS,")
    };
    let input_codec = match info.codec_name.as_deref() {
        Some("vp8") => Some("libvpx"),
        Some("vp9") => Some("libvpx-vp9"),
        _ => None,
    };

    let (cut_from, cut_to) = cut;
    let mut args = vec!["-nostdin".to_owned()];
    if let Some(codec) = input_codec {
        args.extend(["-vcodec".to_owned(), codec.to_owned()]);
    }
    if cut_from > 0.0 {
        args.extend(["-ss".to_owned(), secs_arg(cut_from)]);
    }
    args.extend(["-i".to_owned(), layer.path.clone()]);
    args.extend(["-t".to_owned(), secs_arg((cut_to - cut_from) * speed)]);
    args.extend([
        "-vf".to_owned(),
        format!("{pts_filter}fps={framerate_str},{scale_filter}"),
    ]);
    args.extend(
        [
            "-map",
            "v:0",
            "-vcodec",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-f",
            "image2pipe",
            "-",
        ]
        .map(str::to_owned),
    );

    Ok(VideoDecodePlan {
        args,
        frame_width: frame_w,
        frame_height: frame_h,
        requested,
        target,
        resize_mode,
    })
}

/// Fill `buf` from `reader`. Returns `false` on a clean end of stream before the first byte.
fn read_frame(reader: &mut impl Read, buf: &mut [u8]) -> ClipreelResult<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => {
                return Err(ClipreelError::evaluation(format!(
                    "video stream ended mid-frame ({filled} of {} bytes)",
                    buf.len()
                )));
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => {
                return Err(ClipreelError::evaluation(format!(
                    "failed to read video frame: {e}"
                )));
            }
        }
    }
    Ok(true)
}

fn draw_frame(
    canvas: &mut [u8],
    size: Canvas,
    plan: &VideoDecodePlan,
    img: &PremulImage,
) -> ClipreelResult<()> {
    if plan.resize_mode == ResizeMode::ContainBlur {
        let r = plan.requested;
        let bg = blurred_cover(img, r.w as u32, r.h as u32)?;
        draw_image(canvas, size.width, size.height, &bg, r, 1.0)?;
    }
    draw_image(canvas, size.width, size.height, img, plan.target, 1.0)
}

/// [`LayerSource`] reading frames of one video layer from ffmpeg.
///
/// One decoded frame is consumed per draw. After the stream ends the layer draws nothing.
pub struct VideoLayerSource {
    path: String,
    plan: VideoDecodePlan,
    canvas: Canvas,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    frame: Vec<u8>,
    ended: bool,
}

impl VideoLayerSource {
    /// Spawn `ffmpeg_path` for `plan`.
    pub fn spawn(
        ffmpeg_path: &str,
        path: &str,
        plan: VideoDecodePlan,
        canvas: Canvas,
        enable_ffmpeg_log: bool,
    ) -> ClipreelResult<Self> {
        tracing::debug!(path, args = %plan.args.join(" "), "spawn video decoder");
        let mut child = Command::new(ffmpeg_path)
            .args(common_args(enable_ffmpeg_log))
            .args(&plan.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(if enable_ffmpeg_log {
                Stdio::inherit()
            } else {
                Stdio::null()
            })
            .spawn()
            .map_err(|e| {
                ClipreelError::evaluation(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClipreelError::evaluation("failed to open ffmpeg stdout"))?;
        Ok(Self {
            path: path.to_owned(),
            frame: vec![0u8; plan.frame_len()],
            plan,
            canvas,
            child: Some(child),
            stdout: Some(stdout),
            ended: false,
        })
    }

    fn shutdown(&mut self) {
        drop(self.stdout.take());
        let Some(mut child) = self.child.take() else {
            return;
        };
        let deadline = Instant::now() + KILL_GRACE;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => return,
                Ok(None) if Instant::now() < deadline => std::thread::sleep(KILL_POLL),
                _ => break,
            }
        }
        tracing::debug!(path = %self.path, "killing video decoder");
        let _ = child.kill();
        let _ = child.wait();
    }
}

impl LayerSource for VideoLayerSource {
    fn draw(&mut self, canvas: &mut [u8], _progress: f64, _time: f64) -> ClipreelResult<()> {
        if self.ended {
            return Ok(());
        }
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(());
        };
        if !read_frame(stdout, &mut self.frame)? {
            tracing::debug!(path = %self.path, "video stream ended");
            self.ended = true;
            self.shutdown();
            return Ok(());
        }
        premultiply_in_place(&mut self.frame);
        let img = PremulImage::new(
            self.plan.frame_width,
            self.plan.frame_height,
            std::mem::take(&mut self.frame),
        )?;

        let drawn = draw_frame(canvas, self.canvas, &self.plan, &img);
        self.frame = img.data;
        drawn
    }

    fn close(&mut self) {
        self.shutdown();
    }
}

impl Drop for VideoLayerSource {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/video.rs"]
mod tests;
