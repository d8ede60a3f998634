use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::error::{ClipreelError, ClipreelResult};
use crate::foundation::math::mul_div255_u16;

/// Options for [`FfmpegSink`] output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output file path. A `.gif` extension selects the palette pipeline.
    pub out_path: PathBuf,
    /// `ffmpeg` executable.
    pub ffmpeg_path: String,
    /// Overwrite the output file if it already exists.
    pub overwrite: bool,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
    /// Replace the built-in codec arguments.
    pub custom_output_args: Option<Vec<String>>,
    /// Use the fastest x264 preset.
    pub fast: bool,
    /// Pass ffmpeg's own log through instead of only `error` level.
    pub enable_ffmpeg_log: bool,
}

impl FfmpegSinkOpts {
    /// Create options for writing to `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            ffmpeg_path: "ffmpeg".to_owned(),
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
            custom_output_args: None,
            fast: false,
            enable_ffmpeg_log: false,
        }
    }

    /// Return `true` when the output is a GIF.
    pub fn is_gif(&self) -> bool {
        self.out_path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("gif"))
    }
}

/// Codec arguments placed after the inputs.
pub fn output_args(opts: &FfmpegSinkOpts, cfg: &SinkConfig) -> Vec<String> {
    if let Some(custom) = &opts.custom_output_args {
        return custom.clone();
    }
    let mut args: Vec<String> = Vec::new();
    if cfg.audio.is_some() {
        args.extend(["-acodec", "aac", "-b:a", "128k"].map(str::to_owned));
    }
    if opts.is_gif() {
        args.push("-vf".to_owned());
        args.push(format!(
            "format=rgb24,fps={},scale={}:{}:flags=lanczos,split[s0][s1];[s0]palettegen[p];[s1][p]paletteuse",
            cfg.fps.framerate_str(),
            cfg.width,
            cfg.height
        ));
        args.extend(["-loop", "0"].map(str::to_owned));
    } else {
        args.extend(
            [
                "-vf",
                "format=yuv420p",
                "-vcodec",
                "libx264",
                "-profile:v",
                "high",
                "-preset:v",
                if opts.fast { "ultrafast" } else { "medium" },
                "-crf",
                "18",
                "-movflags",
                "faststart",
            ]
            .map(str::to_owned),
        );
    }
    args
}

/// Full encoder argument list, excluding the binary.
pub fn encoder_args(opts: &FfmpegSinkOpts, cfg: &SinkConfig) -> Vec<String> {
    let mut args: Vec<String> = vec!["-hide_banner".to_owned()];
    if !opts.enable_ffmpeg_log {
        args.extend(["-loglevel", "error"].map(str::to_owned));
    }
    args.extend(
        ["-f", "rawvideo", "-vcodec", "rawvideo", "-pix_fmt", "rgba", "-s"].map(str::to_owned),
    );
    args.push(format!("{}x{}", cfg.width, cfg.height));
    // For rawvideo input `-r` goes before `-i`.
    args.extend(["-r".to_owned(), cfg.fps.framerate_str()]);
    args.extend(["-i", "-"].map(str::to_owned));
    if let Some(audio) = &cfg.audio {
        args.push("-i".to_owned());
        args.push(audio.to_string_lossy().into_owned());
    }
    if !opts.is_gif() {
        args.extend(["-map", "0:v:0"].map(str::to_owned));
    }
    if cfg.audio.is_some() {
        args.extend(["-map", "1:a:0"].map(str::to_owned));
    }
    args.extend(output_args(opts, cfg));
    args.push(if opts.overwrite { "-y" } else { "-n" }.to_owned());
    args.push(opts.out_path.to_string_lossy().into_owned());
    args
}

/// Sink that spawns the system `ffmpeg` and streams raw frames to stdin.
///
/// Audio is optional and provided through [`SinkConfig::audio`].
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<u64>,
}

impl FfmpegSink {
    /// Create a new sink that streams into `ffmpeg`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }

    fn drained_stderr(&mut self) -> String {
        match self.stderr_drain.take().map(|h| h.join()) {
            Some(Ok(Ok(bytes))) => String::from_utf8_lossy(&bytes).trim().to_owned(),
            _ => String::new(),
        }
    }

    fn check_alive(&mut self) -> ClipreelResult<()> {
        let Some(child) = self.child.as_mut() else {
            return Err(ClipreelError::evaluation("ffmpeg sink not started"));
        };
        let exited = child.try_wait().map_err(|e| {
            ClipreelError::evaluation(format!("failed to poll ffmpeg encoder: {e}"))
        })?;
        if let Some(status) = exited {
            self.child = None;
            drop(self.stdin.take());
            let stderr = self.drained_stderr();
            return Err(ClipreelError::evaluation(format!(
                "ffmpeg encoder exited early with status {status}: {stderr}"
            )));
        }
        Ok(())
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> ClipreelResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(ClipreelError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ClipreelError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        let yuv420 = !self.opts.is_gif() && self.opts.custom_output_args.is_none();
        if yuv420 && (!cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2)) {
            return Err(ClipreelError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p output)",
            ));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(ClipreelError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        let args = encoder_args(&self.opts, &cfg);
        tracing::debug!(args = %args.join(" "), "spawn encoder");
        let mut child = Command::new(&self.opts.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ClipreelError::evaluation(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ClipreelError::evaluation("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ClipreelError::evaluation("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.scratch = vec![0u8; cfg.frame_len()];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: u64, frame: &[u8]) -> ClipreelResult<()> {
        if self.cfg.is_none() {
            return Err(ClipreelError::evaluation("ffmpeg sink not started"));
        }
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(ClipreelError::evaluation(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);
        if frame.len() != self.scratch.len() {
            return Err(ClipreelError::validation(format!(
                "frame has {} bytes, expected {}",
                frame.len(),
                self.scratch.len()
            )));
        }
        self.check_alive()?;

        flatten_premul_over_bg_to_opaque_rgba8(&mut self.scratch, frame, self.opts.bg_rgba)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ClipreelError::evaluation("ffmpeg sink is already finalized"));
        };
        stdin.write_all(&self.scratch).map_err(|e| {
            ClipreelError::evaluation(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> ClipreelResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| ClipreelError::evaluation("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            ClipreelError::evaluation(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ClipreelError::evaluation("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| {
                    ClipreelError::evaluation(format!("ffmpeg stderr read failed: {e}"))
                })?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(ClipreelError::evaluation(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        self.cfg = None;
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            tracing::debug!("killing encoder");
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = self.drained_stderr();
        self.cfg = None;
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.abort();
        }
    }
}

fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> ClipreelResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(ClipreelError::validation(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = u16::from(bg_rgba[0]);
    let bg_g = u16::from(bg_rgba[1]);
    let bg_b = u16::from(bg_rgba[2]);

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        let r = u16::from(s[0]) + mul_div255_u16(bg_r, inv);
        let g = u16::from(s[1]) + mul_div255_u16(bg_g, inv);
        let b = u16::from(s[2]) + mul_div255_u16(bg_b, inv);

        d[0] = r.min(255) as u8;
        d[1] = g.min(255) as u8;
        d[2] = b.min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ClipreelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
