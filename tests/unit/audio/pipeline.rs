use std::collections::HashSet;
use std::sync::Mutex;

use super::*;
use crate::media::probe::{ProbeResult, StreamInfo};
use crate::plan::timing::LayerWindow;
use crate::scene::layer::{AudioLayer, VideoLayer};
use crate::transition::resolve::ResolvedTransition;

#[derive(Default)]
struct RecordingRunner {
    calls: Mutex<Vec<Vec<String>>>,
    fail_on: Option<String>,
}

impl FfmpegRunner for RecordingRunner {
    fn run(&self, args: &[String]) -> ClipreelResult<()> {
        self.calls.lock().unwrap().push(args.to_vec());
        if let Some(needle) = &self.fail_on
            && args.iter().any(|a| a == needle)
        {
            return Err(ClipreelError::evaluation("ffmpeg failed"));
        }
        Ok(())
    }
}

impl RecordingRunner {
    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

struct FakeProbe {
    with_audio: HashSet<String>,
}

impl MediaProbe for FakeProbe {
    fn probe(&self, path: &str) -> ClipreelResult<ProbeResult> {
        let mut streams = vec![StreamInfo {
            codec_type: Some("video".to_owned()),
            ..StreamInfo::default()
        }];
        if self.with_audio.contains(path) {
            streams.push(StreamInfo {
                codec_type: Some("audio".to_owned()),
                ..StreamInfo::default()
            });
        }
        Ok(ProbeResult {
            duration: Some(10.0),
            streams,
        })
    }
}

fn probe(paths: &[&str]) -> Arc<FakeProbe> {
    Arc::new(FakeProbe {
        with_audio: paths.iter().map(|p| (*p).to_owned()).collect(),
    })
}

fn full(duration: f64) -> LayerWindow {
    LayerWindow {
        start: 0.0,
        stop: duration,
        duration,
    }
}

fn audio_layer(path: &str, duration: f64, speed: f64, volume: Option<f64>) -> ProcessedLayer {
    ProcessedLayer {
        kind: LayerKind::Audio(AudioLayer {
            path: path.to_owned(),
            mix_volume: volume,
            ..AudioLayer::default()
        }),
        window: full(duration),
        speed_factor: speed,
        cut: Some((0.0, duration / speed)),
        media: None,
    }
}

fn clip(duration: f64, layers: Vec<ProcessedLayer>) -> ProcessedClip {
    ProcessedClip {
        layers,
        duration,
        transition: ResolvedTransition::none(),
    }
}

fn pipeline(runner: &Arc<RecordingRunner>, probe: Arc<FakeProbe>) -> AudioPipeline {
    AudioPipeline::new(runner.clone(), probe, PathBuf::from("/tmp/reel")).with_threads(1)
}

fn keep() -> AudioOptions {
    AudioOptions {
        keep_source_audio: true,
        ..AudioOptions::default()
    }
}

fn is_silence(args: &[String]) -> bool {
    args.iter().any(|a| a.starts_with("anullsrc"))
}

#[test]
fn nothing_to_mix_returns_none() {
    let runner = Arc::new(RecordingRunner::default());
    let p = pipeline(&runner, probe(&[]));
    let clips = [clip(2.0, vec![])];
    assert_eq!(p.edit_audio(&clips, &[], &AudioOptions::default()).unwrap(), None);
    assert!(runner.calls().is_empty());
}

#[test]
fn gif_output_has_no_audio() {
    let runner = Arc::new(RecordingRunner::default());
    let p = pipeline(&runner, probe(&["a.mp3"]));
    let clips = [clip(2.0, vec![audio_layer("a.mp3", 2.0, 1.0, None)])];
    let opts = AudioOptions {
        no_audio_output: true,
        ..keep()
    };
    assert_eq!(p.edit_audio(&clips, &[], &opts).unwrap(), None);
    assert!(runner.calls().is_empty());
}

#[test]
fn all_silent_without_arbitrary_audio_returns_none() {
    let runner = Arc::new(RecordingRunner::default());
    let p = pipeline(&runner, probe(&[]));
    let clips = [clip(2.0, vec![audio_layer("mute.mp4", 2.0, 1.0, None)])];
    assert_eq!(p.edit_audio(&clips, &[], &keep()).unwrap(), None);
    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert!(is_silence(&calls[0]));
}

#[test]
fn out_of_range_speed_falls_back_to_silence() {
    let runner = Arc::new(RecordingRunner::default());
    let p = pipeline(&runner, probe(&["fast.mp3"]));
    let clips = [clip(3.5, vec![audio_layer("fast.mp3", 3.5, 3.5, None)])];
    let out = p.mixed_clip_audio(&clips, true).unwrap();
    assert_eq!(out.len(), 1);
    assert!(out[0].silent);
    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert!(is_silence(&calls[0]));
    let at = calls[0].iter().position(|a| a == "-t").unwrap();
    assert_eq!(calls[0][at + 1], "3.5");
}

#[test]
fn failed_extraction_degrades_to_silence() {
    let runner = Arc::new(RecordingRunner {
        fail_on: Some("a:0".to_owned()),
        ..RecordingRunner::default()
    });
    let p = pipeline(&runner, probe(&["a.mp3"]));
    let clips = [clip(2.0, vec![audio_layer("a.mp3", 2.0, 1.0, None)])];
    let out = p.mixed_clip_audio(&clips, true).unwrap();
    assert!(out[0].silent);
}

#[test]
fn partial_window_layers_are_ignored() {
    let runner = Arc::new(RecordingRunner::default());
    let p = pipeline(&runner, probe(&["a.mp3"]));
    let mut layer = audio_layer("a.mp3", 1.0, 1.0, None);
    layer.window = LayerWindow {
        start: 1.0,
        stop: 2.0,
        duration: 1.0,
    };
    let out = p.mixed_clip_audio(&[clip(2.0, vec![layer])], true).unwrap();
    assert!(out[0].silent);
}

#[test]
fn single_layer_passes_through_and_two_layers_mix() {
    let runner = Arc::new(RecordingRunner::default());
    let p = pipeline(&runner, probe(&["a.mp3", "b.mp4"]));
    let video = ProcessedLayer {
        kind: LayerKind::Video(VideoLayer {
            path: "b.mp4".to_owned(),
            mix_volume: Some(0.3),
            ..VideoLayer::default()
        }),
        window: full(2.0),
        speed_factor: 1.0,
        cut: Some((0.0, 2.0)),
        media: None,
    };
    let clips = [
        clip(2.0, vec![audio_layer("a.mp3", 2.0, 1.0, None)]),
        clip(
            2.0,
            vec![audio_layer("a.mp3", 2.0, 0.5, Some(2.0)), video],
        ),
    ];
    let out = p.mixed_clip_audio(&clips, true).unwrap();
    assert_eq!(out[0].path, PathBuf::from("/tmp/reel/clip0-layer0-audio.flac"));
    assert!(!out[0].silent);
    assert_eq!(out[1].path, PathBuf::from("/tmp/reel/clip1-audio.flac"));

    let calls = runner.calls();
    let amix = calls
        .iter()
        .find(|c| c.iter().any(|a| a.starts_with("amix=")))
        .unwrap();
    assert!(amix.iter().any(|a| a == "amix=inputs=2:duration=longest:weights=2 0.3"));
    assert!(calls.iter().any(|c| c.iter().any(|a| a == "atempo=2")));
}

#[test]
fn crossfade_uses_safe_durations_and_background_mix_is_anchored() {
    let runner = Arc::new(RecordingRunner::default());
    let p = pipeline(&runner, probe(&[]));
    let mut first = clip(4.0, vec![]);
    first.transition.duration = 1.0;
    first.transition.audio_out_curve = "exp".to_owned();
    let clips = [first, clip(3.0, vec![])];

    let mut bg = AudioTrack::new("bg.mp3");
    bg.mix_volume = Some(0.5);
    bg.loop_count = Some(-1);
    let out = p.edit_audio(&clips, &[bg], &AudioOptions::default()).unwrap();
    assert_eq!(out, Some(PathBuf::from("/tmp/reel/audio-mixed.flac")));

    let calls = runner.calls();
    assert_eq!(calls.iter().filter(|c| is_silence(c)).count(), 2);
    assert!(calls.iter().any(|c| c
        .iter()
        .any(|a| a == "[0:a][1:a]acrossfade=d=1:c1=exp:c2=tri")));

    let mix = calls.last().unwrap();
    let s = mix.join(" ");
    assert!(s.contains("-stream_loop 0 -i /tmp/reel/audio-concat.flac -stream_loop -1 -i bg.mp3"));
    assert!(s.contains("weights=1 0.5"));
}

#[test]
fn output_volume_forces_a_final_mix() {
    let runner = Arc::new(RecordingRunner::default());
    let p = pipeline(&runner, probe(&["a.mp3"]));
    let clips = [clip(2.0, vec![audio_layer("a.mp3", 2.0, 1.0, None)])];
    let opts = AudioOptions {
        output_volume: Some(OutputVolume::Factor(2.0)),
        ..keep()
    };
    let out = p.edit_audio(&clips, &[], &opts).unwrap();
    assert_eq!(out, Some(PathBuf::from("/tmp/reel/audio-mixed.flac")));
    let mix = runner.calls().last().unwrap().clone();
    assert!(mix.iter().any(|a| a.ends_with(",volume=2")));
}

#[test]
fn source_audio_alone_skips_the_mix() {
    let runner = Arc::new(RecordingRunner::default());
    let p = pipeline(&runner, probe(&["a.mp3"]));
    let clips = [clip(2.0, vec![audio_layer("a.mp3", 2.0, 1.0, None)])];
    let out = p.edit_audio(&clips, &[], &keep()).unwrap();
    assert_eq!(out, Some(PathBuf::from("/tmp/reel/clip0-layer0-audio.flac")));
}
