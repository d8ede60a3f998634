use std::path::PathBuf;

use super::*;

#[test]
fn tempo_tolerance_and_range() {
    assert_eq!(Tempo::for_speed(1.005), Tempo::Unchanged);
    assert_eq!(Tempo::for_speed(0.5), Tempo::Atempo(2.0));
    assert_eq!(Tempo::for_speed(2.0), Tempo::Atempo(0.5));
    match Tempo::for_speed(3.5) {
        Tempo::OutOfRange(r) => assert!((r - 1.0 / 3.5).abs() < 1e-12),
        other => panic!("expected out of range, got {other:?}"),
    }
    assert!(matches!(Tempo::for_speed(0.001), Tempo::OutOfRange(_)));
}

#[test]
fn silence_has_exact_duration() {
    let args = silence_args(false, 2.5, Path::new("/tmp/clip0-audio.flac"));
    let at = args.iter().position(|a| a == "-t").unwrap();
    assert_eq!(args[at + 1], "2.5");
    assert!(args.iter().any(|a| a == "anullsrc=channel_layout=stereo:sample_rate=44100"));
    assert_eq!(args.last().unwrap(), "/tmp/clip0-audio.flac");
}

#[test]
fn extract_applies_cut_speed_and_atempo() {
    let args = extract_args(
        false,
        "in.mp4",
        (1.0, 3.0),
        0.5,
        Some(2.0),
        Path::new("o.flac"),
    );
    let s = args.join(" ");
    assert!(s.contains("-ss 1 -i in.mp4 -t 1 "));
    assert!(s.contains("-map a:0 -c:a flac -filter:a atempo=2 -y o.flac"));

    let args = extract_args(false, "in.mp4", (0.0, 3.0), 1.0, None, Path::new("o.flac"));
    assert!(!args.iter().any(|a| a == "-ss" || a == "-filter:a"));
}

#[test]
fn amix_weights_follow_inputs() {
    let a = PathBuf::from("a.flac");
    let b = PathBuf::from("b.flac");
    let args = amix_args(false, &[(&a, 1.0), (&b, 0.25)], Path::new("o.flac"));
    assert!(args.iter().any(|x| x == "amix=inputs=2:duration=longest:weights=1 0.25"));
}

fn fade(d: f64) -> Crossfade {
    Crossfade {
        duration: d,
        out_curve: "tri".to_owned(),
        in_curve: "qsin".to_owned(),
    }
}

#[test]
fn crossfade_chain_labels_intermediate_streams() {
    assert_eq!(
        crossfade_filter(&[fade(0.5)]),
        "[0:a][1:a]acrossfade=d=0.5:c1=tri:c2=qsin"
    );
    assert_eq!(
        crossfade_filter(&[fade(0.5), fade(0.0)]),
        "[0:a][1:a]acrossfade=d=0.5:c1=tri:c2=qsin[concat0],\
         [concat0][2:a]acrossfade=d=0.0001:c1=tri:c2=qsin"
    );
}

fn stream(path: &str, volume: f64) -> MixStream {
    MixStream {
        path: path.to_owned(),
        mix_volume: volume,
        cut_from: 0.0,
        cut_to: None,
        start: 0.0,
        loop_count: 0,
    }
}

#[test]
fn mix_anchors_on_first_stream() {
    let mut bg = stream("bg.mp3", 0.5);
    bg.loop_count = -1;
    let mut detached = stream("d.mp3", 1.0);
    detached.cut_from = 1.5;
    detached.cut_to = Some(4.0);
    detached.start = 2.3456;
    let streams = [stream("concat.flac", 1.0), bg, detached];

    let graph = mix_filter(&streams, &MixOptions::default());
    assert_eq!(
        graph,
        "[0]atrim=start=0,adelay=delays=0:all=1[a0];\
         [1]atrim=start=0,adelay=delays=0:all=1,apad[a1];\
         [2]atrim=start=1.5:end=4,adelay=delays=2345:all=1,apad[a2];\
         [a0][a1][a2]amix=inputs=3:duration=first:dropout_transition=0:weights=1 0.5 1"
    );

    let args = mix_args(false, &streams, &MixOptions::default(), Path::new("m.flac"));
    let s = args.join(" ");
    assert!(s.contains("-stream_loop 0 -i concat.flac -stream_loop -1 -i bg.mp3"));
    assert!(s.contains("-i d.mp3 -vn -filter_complex"));
}

#[test]
fn normalization_and_gain_follow_amix() {
    let opts = MixOptions {
        audio_norm: Some(AudioNorm {
            enable: true,
            gauss_size: 7,
            max_gain: 20.0,
        }),
        output_volume: Some(OutputVolume::Expr("3dB".to_owned())),
    };
    let graph = mix_filter(&[stream("c.flac", 1.0)], &opts);
    assert!(graph.ends_with("weights=1,dynaudnorm=g=7:maxgain=20,volume=3dB"));

    let disabled = MixOptions {
        audio_norm: Some(AudioNorm::default()),
        output_volume: None,
    };
    assert!(!mix_filter(&[stream("c.flac", 1.0)], &disabled).contains("dynaudnorm"));
}
