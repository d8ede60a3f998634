//! ffmpeg argument and filter-graph builders for the audio pipeline.
//!
//! Every builder is pure: it returns the argument list, the pipeline runs it.

use std::path::Path;

use crate::media::ffmpeg::{common_args, secs_arg};
use crate::scene::model::{AudioNorm, OutputVolume};

/// Sample format of every intermediate file.
pub const SAMPLE_FMT: &str = "s32";
/// Sample rate of every intermediate file.
pub const SAMPLE_RATE: &str = "48000";
/// Speed deviation below which no `atempo` filter is applied.
pub const TEMPO_TOLERANCE: f64 = 0.01;
/// `atempo` range accepted by ffmpeg.
pub const ATEMPO_RANGE: (f64, f64) = (0.5, 100.0);
/// `acrossfade` duration used in place of zero, which ffmpeg would read as one second.
pub const CROSSFADE_EPSILON: f64 = 0.0001;

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn weights(values: impl Iterator<Item = f64>) -> String {
    values.map(|w| format!("{w}")).collect::<Vec<_>>().join(" ")
}

/// Tempo correction for a layer played at `speed_factor`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tempo {
    /// Close enough to `1`, no filter.
    Unchanged,
    /// `atempo` ratio to apply.
    Atempo(f64),
    /// The required ratio is outside [`ATEMPO_RANGE`].
    OutOfRange(f64),
}

impl Tempo {
    /// Tempo correction for `speed_factor` (ratio `1 / speed_factor`).
    pub fn for_speed(speed_factor: f64) -> Self {
        if (speed_factor - 1.0).abs() <= TEMPO_TOLERANCE {
            return Self::Unchanged;
        }
        let ratio = 1.0 / speed_factor;
        if ratio.is_finite() && ratio >= ATEMPO_RANGE.0 && ratio <= ATEMPO_RANGE.1 {
            Self::Atempo(ratio)
        } else {
            Self::OutOfRange(ratio)
        }
    }
}

/// Stereo silence of `duration` seconds.
pub fn silence_args(enable_log: bool, duration: f64, out: &Path) -> Vec<String> {
    let mut args = common_args(enable_log);
    args.extend(
        [
            "-f",
            "lavfi",
            "-i",
            "anullsrc=channel_layout=stereo:sample_rate=44100",
            "-sample_fmt",
            SAMPLE_FMT,
            "-ar",
            SAMPLE_RATE,
            "-t",
        ]
        .map(str::to_owned),
    );
    args.push(secs_arg(duration));
    args.extend(["-c:a", "flac", "-y"].map(str::to_owned));
    args.push(path_arg(out));
    args
}

/// First audio stream of `input` between `cut_from` and `cut_to`, stretched by `speed_factor`.
pub fn extract_args(
    enable_log: bool,
    input: &str,
    (cut_from, cut_to): (f64, f64),
    speed_factor: f64,
    atempo: Option<f64>,
    out: &Path,
) -> Vec<String> {
    let mut args = common_args(enable_log);
    if cut_from > 0.0 {
        args.extend(["-ss".to_owned(), secs_arg(cut_from)]);
    }
    args.extend(["-i".to_owned(), input.to_owned()]);
    args.extend(["-t".to_owned(), secs_arg((cut_to - cut_from) * speed_factor)]);
    args.extend(
        [
            "-sample_fmt",
            SAMPLE_FMT,
            "-ar",
            SAMPLE_RATE,
            "-map",
            "a:0",
            "-c:a",
            "flac",
        ]
        .map(str::to_owned),
    );
    if let Some(ratio) = atempo {
        args.extend(["-filter:a".to_owned(), format!("atempo={ratio}")]);
    }
    args.push("-y".to_owned());
    args.push(path_arg(out));
    args
}

/// Weighted `amix` of per-layer files into one clip track.
pub fn amix_args(enable_log: bool, inputs: &[(&Path, f64)], out: &Path) -> Vec<String> {
    let mut args = common_args(enable_log);
    for (path, _) in inputs {
        args.extend(["-i".to_owned(), path_arg(path)]);
    }
    args.push("-filter_complex".to_owned());
    args.push(format!(
        "amix=inputs={}:duration=longest:weights={}",
        inputs.len(),
        weights(inputs.iter().map(|(_, w)| *w))
    ));
    args.extend(["-c:a", "flac", "-y"].map(str::to_owned));
    args.push(path_arg(out));
    args
}

/// One `acrossfade` boundary between consecutive clip tracks.
#[derive(Clone, Debug, PartialEq)]
pub struct Crossfade {
    /// Overlap in seconds (the safe transition duration).
    pub duration: f64,
    /// Curve of the outgoing track.
    pub out_curve: String,
    /// Curve of the incoming track.
    pub in_curve: String,
}

/// Chained `acrossfade` graph over `fades.len() + 1` inputs.
pub fn crossfade_filter(fades: &[Crossfade]) -> String {
    let mut in_stream = "[0:a]".to_owned();
    let mut parts = Vec::with_capacity(fades.len());
    for (i, fade) in fades.iter().enumerate() {
        let out_stream = format!("[concat{i}]");
        let mut part = format!(
            "{in_stream}[{}:a]acrossfade=d={}:c1={}:c2={}",
            i + 1,
            fade.duration.max(CROSSFADE_EPSILON),
            fade.out_curve,
            fade.in_curve
        );
        if i + 1 < fades.len() {
            part.push_str(&out_stream);
        }
        parts.push(part);
        in_stream = out_stream;
    }
    parts.join(",")
}

/// Concatenate clip tracks with crossfades.
pub fn crossfade_args(
    enable_log: bool,
    inputs: &[&Path],
    fades: &[Crossfade],
    out: &Path,
) -> Vec<String> {
    let mut args = common_args(enable_log);
    for path in inputs {
        args.extend(["-i".to_owned(), path_arg(path)]);
    }
    args.push("-filter_complex".to_owned());
    args.push(crossfade_filter(fades));
    args.extend(["-c", "flac", "-y"].map(str::to_owned));
    args.push(path_arg(out));
    args
}

/// One input of the final mix. Input `0` is the clip track and sets the output length.
#[derive(Clone, Debug, PartialEq)]
pub struct MixStream {
    /// Source path or URL.
    pub path: String,
    /// Mix weight.
    pub mix_volume: f64,
    /// Trim start in the source.
    pub cut_from: f64,
    /// Trim end in the source.
    pub cut_to: Option<f64>,
    /// Offset in the output timeline.
    pub start: f64,
    /// `-stream_loop` count.
    pub loop_count: i32,
}

/// Options applied after the final `amix`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MixOptions {
    /// Loudness normalization.
    pub audio_norm: Option<AudioNorm>,
    /// Final gain.
    pub output_volume: Option<OutputVolume>,
}

/// Filter graph mixing the clip track with arbitrary tracks.
pub fn mix_filter(streams: &[MixStream], opts: &MixOptions) -> String {
    let mut graph = streams
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let end = s.cut_to.map(|t| format!(":end={t}")).unwrap_or_default();
            let pad = if i > 0 { ",apad" } else { "" };
            let delay_ms = (s.start.max(0.0) * 1000.0).floor() as u64;
            format!(
                "[{i}]atrim=start={}{end},adelay=delays={delay_ms}:all=1{pad}[a{i}]",
                s.cut_from
            )
        })
        .collect::<Vec<_>>()
        .join(";");

    graph.push(';');
    for i in 0..streams.len() {
        graph.push_str(&format!("[a{i}]"));
    }
    graph.push_str(&format!(
        "amix=inputs={}:duration=first:dropout_transition=0:weights={}",
        streams.len(),
        weights(streams.iter().map(|s| s.mix_volume))
    ));
    if let Some(norm) = opts.audio_norm.as_ref().filter(|n| n.enable) {
        graph.push_str(&format!(
            ",dynaudnorm=g={}:maxgain={}",
            norm.gauss_size, norm.max_gain
        ));
    }
    if let Some(volume) = &opts.output_volume {
        graph.push_str(&format!(",volume={}", volume.filter_value()));
    }
    graph
}

/// Final mix of the clip track (first stream) and arbitrary tracks. Video streams are dropped.
pub fn mix_args(
    enable_log: bool,
    streams: &[MixStream],
    opts: &MixOptions,
    out: &Path,
) -> Vec<String> {
    let mut args = common_args(enable_log);
    for s in streams {
        args.extend([
            "-stream_loop".to_owned(),
            s.loop_count.to_string(),
            "-i".to_owned(),
            s.path.clone(),
        ]);
    }
    args.push("-vn".to_owned());
    args.push("-filter_complex".to_owned());
    args.push(mix_filter(streams, opts));
    args.extend(["-c:a", "flac", "-y"].map(str::to_owned));
    args.push(path_arg(out));
    args
}

#[cfg(test)]
#[path = "../../tests/unit/audio/graph.rs"]
mod tests;
