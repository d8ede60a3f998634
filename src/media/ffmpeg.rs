use std::process::{Command, Stdio};

use crate::foundation::error::{ClipreelError, ClipreelResult};

/// Runs one-shot ffmpeg invocations to completion.
pub trait FfmpegRunner: Send + Sync {
    /// Run ffmpeg with `args`. A non-zero exit is an error.
    fn run(&self, args: &[String]) -> ClipreelResult<()>;
}

/// [`FfmpegRunner`] backed by the system `ffmpeg` binary.
#[derive(Clone, Debug)]
pub struct SystemFfmpeg {
    ffmpeg_path: String,
}

impl SystemFfmpeg {
    /// Run through the `ffmpeg` executable at `ffmpeg_path`.
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

impl FfmpegRunner for SystemFfmpeg {
    fn run(&self, args: &[String]) -> ClipreelResult<()> {
        tracing::debug!(ffmpeg = %self.ffmpeg_path, args = %args.join(" "), "spawn ffmpeg");
        let out = Command::new(&self.ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ClipreelError::evaluation(format!("failed to run ffmpeg: {e}")))?;
        if !out.status.success() {
            return Err(ClipreelError::evaluation(format!(
                "ffmpeg exited with status {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(())
    }
}

/// Arguments prepended to every ffmpeg invocation.
pub fn common_args(enable_ffmpeg_log: bool) -> Vec<String> {
    let mut args = vec!["-hide_banner".to_owned()];
    if !enable_ffmpeg_log {
        args.extend(["-loglevel".to_owned(), "error".to_owned()]);
    }
    args
}

/// Format seconds the way ffmpeg time arguments expect.
pub fn secs_arg(secs: f64) -> String {
    let s = format!("{secs:.6}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" {
        "0".to_owned()
    } else {
        s.to_owned()
    }
}

/// Return `true` when `bin -version` runs successfully.
pub fn is_available(bin: &str) -> bool {
    Command::new(bin)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}
