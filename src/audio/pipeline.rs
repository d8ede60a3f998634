use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::audio::graph::{self, Crossfade, MixOptions, MixStream, Tempo};
use crate::foundation::core::{IO_CONCURRENCY, build_thread_pool};
use crate::foundation::error::{ClipreelError, ClipreelResult};
use crate::media::ffmpeg::FfmpegRunner;
use crate::media::probe::MediaProbe;
use crate::plan::planner::{ProcessedClip, ProcessedLayer};
use crate::scene::layer::LayerKind;
use crate::scene::model::{AudioNorm, AudioTrack, OutputVolume};

/// Audio settings of one render.
#[derive(Clone, Debug)]
pub struct AudioOptions {
    /// Use the audio of `video` and `audio` layers instead of silence.
    pub keep_source_audio: bool,
    /// Weight of the concatenated clip track in the final mix.
    pub clips_audio_volume: f64,
    /// Loudness normalization of the final mix.
    pub audio_norm: Option<AudioNorm>,
    /// Final gain.
    pub output_volume: Option<OutputVolume>,
    /// The output format has no audio stream (GIF).
    pub no_audio_output: bool,
}

impl Default for AudioOptions {
    fn default() -> Self {
        Self {
            keep_source_audio: false,
            clips_audio_volume: 1.0,
            audio_norm: None,
            output_volume: None,
            no_audio_output: false,
        }
    }
}

/// Track produced for one clip.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipAudio {
    /// FLAC file covering the clip duration.
    pub path: PathBuf,
    /// Generated silence rather than source audio.
    pub silent: bool,
}

/// Builds the audio track of a render with one-shot ffmpeg runs in a scratch directory.
pub struct AudioPipeline {
    runner: Arc<dyn FfmpegRunner>,
    probe: Arc<dyn MediaProbe>,
    tmp_dir: PathBuf,
    enable_ffmpeg_log: bool,
    threads: usize,
}

impl AudioPipeline {
    /// Pipeline writing its intermediate files into `tmp_dir`.
    pub fn new(runner: Arc<dyn FfmpegRunner>, probe: Arc<dyn MediaProbe>, tmp_dir: PathBuf) -> Self {
        Self {
            runner,
            probe,
            tmp_dir,
            enable_ffmpeg_log: false,
            threads: IO_CONCURRENCY,
        }
    }

    /// Pass ffmpeg's own log through.
    pub fn with_ffmpeg_log(mut self, enable: bool) -> Self {
        self.enable_ffmpeg_log = enable;
        self
    }

    /// Bound on concurrent extractions.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Produce the mixed audio file for `clips` and `arbitrary` tracks.
    ///
    /// Returns `None` when there is nothing to mix or the output cannot carry audio.
    #[tracing::instrument(skip_all, fields(clips = clips.len(), arbitrary = arbitrary.len()))]
    pub fn edit_audio(
        &self,
        clips: &[ProcessedClip],
        arbitrary: &[AudioTrack],
        opts: &AudioOptions,
    ) -> ClipreelResult<Option<PathBuf>> {
        if opts.no_audio_output || clips.is_empty() {
            return Ok(None);
        }
        if !opts.keep_source_audio && arbitrary.is_empty() {
            return Ok(None);
        }

        tracing::info!("extracting audio/silence from all clips");
        let clip_audio = self.mixed_clip_audio(clips, opts.keep_source_audio)?;
        if clip_audio.iter().all(|c| c.silent) && arbitrary.is_empty() {
            tracing::info!("only silent clip audio, skipping the audio track");
            return Ok(None);
        }

        let concat = self.crossfade_concat(clips, &clip_audio)?;

        let mix = MixOptions {
            audio_norm: opts.audio_norm,
            output_volume: opts.output_volume.clone(),
        };
        let post_filters = mix.output_volume.is_some()
            || mix.audio_norm.as_ref().is_some_and(|n| n.enable);
        if arbitrary.is_empty() && !post_filters {
            return Ok(Some(concat));
        }

        tracing::info!("mixing clip audio with arbitrary audio");
        let mut streams = vec![MixStream {
            path: concat.to_string_lossy().into_owned(),
            mix_volume: opts.clips_audio_volume,
            cut_from: 0.0,
            cut_to: None,
            start: 0.0,
            loop_count: 0,
        }];
        streams.extend(arbitrary.iter().map(|t| MixStream {
            path: t.path.clone(),
            mix_volume: t.mix_volume.unwrap_or(1.0),
            cut_from: t.cut_from.unwrap_or(0.0),
            cut_to: t.cut_to,
            start: t.start.unwrap_or(0.0),
            loop_count: t.loop_count.unwrap_or(0),
        }));
        let out = self.tmp_dir.join("audio-mixed.flac");
        self.runner.run(&graph::mix_args(
            self.enable_ffmpeg_log,
            &streams,
            &mix,
            &out,
        ))?;
        Ok(Some(out))
    }

    /// One track per clip: source audio, a mix of layers, or silence.
    pub fn mixed_clip_audio(
        &self,
        clips: &[ProcessedClip],
        keep_source_audio: bool,
    ) -> ClipreelResult<Vec<ClipAudio>> {
        let pool = build_thread_pool(Some(self.threads))?;
        pool.install(|| {
            use rayon::prelude::*;
            clips
                .par_iter()
                .enumerate()
                .map(|(i, clip)| self.clip_audio(i, clip, keep_source_audio))
                .collect()
        })
    }

    fn silence(&self, clip_index: usize, duration: f64, out: PathBuf) -> ClipreelResult<ClipAudio> {
        tracing::debug!(clip = clip_index, duration, "create silence");
        self.runner
            .run(&graph::silence_args(self.enable_ffmpeg_log, duration, &out))?;
        Ok(ClipAudio {
            path: out,
            silent: true,
        })
    }

    fn clip_audio(
        &self,
        clip_index: usize,
        clip: &ProcessedClip,
        keep_source_audio: bool,
    ) -> ClipreelResult<ClipAudio> {
        let out = self.tmp_dir.join(format!("clip{clip_index}-audio.flac"));
        if !keep_source_audio {
            return self.silence(clip_index, clip.duration, out);
        }

        let candidates: Vec<&ProcessedLayer> = clip
            .layers
            .iter()
            .filter(|l| matches!(l.kind, LayerKind::Video(_) | LayerKind::Audio(_)))
            .filter(|l| l.window.spans(clip.duration))
            .collect();

        let mut extracted: Vec<(PathBuf, f64)> = Vec::new();
        for (j, layer) in candidates.iter().enumerate() {
            if let Some(path) = self.extract_layer(clip_index, j, layer) {
                extracted.push((path, layer.mix_volume()));
            }
        }

        match extracted.len() {
            0 => self.silence(clip_index, clip.duration, out),
            1 => Ok(ClipAudio {
                path: extracted.remove(0).0,
                silent: false,
            }),
            _ => {
                let inputs: Vec<(&Path, f64)> =
                    extracted.iter().map(|(p, w)| (p.as_path(), *w)).collect();
                self.runner
                    .run(&graph::amix_args(self.enable_ffmpeg_log, &inputs, &out))?;
                Ok(ClipAudio {
                    path: out,
                    silent: false,
                })
            }
        }
    }

    /// Extract one layer's audio. Every failure degrades to `None` (silence for that layer).
    fn extract_layer(
        &self,
        clip_index: usize,
        layer_index: usize,
        layer: &ProcessedLayer,
    ) -> Option<PathBuf> {
        let path = layer.media_path()?;
        match self.probe.probe(path) {
            Ok(info) if info.has_audio() => {}
            Ok(_) => return None,
            Err(err) => {
                tracing::warn!(clip = clip_index, path, error = %err, "cannot probe audio, using silence");
                return None;
            }
        }

        let atempo = match Tempo::for_speed(layer.speed_factor) {
            Tempo::Unchanged => None,
            Tempo::Atempo(ratio) => Some(ratio),
            Tempo::OutOfRange(ratio) => {
                tracing::warn!(
                    clip = clip_index,
                    ratio,
                    "audio speed is outside the accepted range, using silence"
                );
                return None;
            }
        };

        let cut = layer.cut.unwrap_or((0.0, layer.window.duration));
        let out = self
            .tmp_dir
            .join(format!("clip{clip_index}-layer{layer_index}-audio.flac"));
        let args = graph::extract_args(
            self.enable_ffmpeg_log,
            path,
            cut,
            layer.speed_factor,
            atempo,
            &out,
        );
        match self.runner.run(&args) {
            Ok(()) => Some(out),
            Err(err) => {
                tracing::warn!(clip = clip_index, path, error = %err, "cannot extract audio, using silence");
                None
            }
        }
    }

    fn crossfade_concat(
        &self,
        clips: &[ProcessedClip],
        clip_audio: &[ClipAudio],
    ) -> ClipreelResult<PathBuf> {
        let Some(first) = clip_audio.first() else {
            return Err(ClipreelError::evaluation("no clip audio to concatenate"));
        };
        if clip_audio.len() < 2 {
            return Ok(first.path.clone());
        }

        let fades: Vec<Crossfade> = clips[..clip_audio.len() - 1]
            .iter()
            .map(|c| Crossfade {
                duration: c.transition.duration,
                out_curve: c.transition.audio_out_curve.clone(),
                in_curve: c.transition.audio_in_curve.clone(),
            })
            .collect();
        let inputs: Vec<&Path> = clip_audio.iter().map(|c| c.path.as_path()).collect();
        let out = self.tmp_dir.join("audio-concat.flac");
        self.runner.run(&graph::crossfade_args(
            self.enable_ffmpeg_log,
            &inputs,
            &fades,
            &out,
        ))?;
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/pipeline.rs"]
mod tests;
