use super::*;

#[test]
fn window_defaults_to_whole_clip() {
    let w = layer_window(None, None, 4.0).unwrap();
    assert_eq!(w, LayerWindow { start: 0.0, stop: 4.0, duration: 4.0 });
    assert!(w.spans(4.0));
}

#[test]
fn partial_window_does_not_span() {
    let w = layer_window(Some(1.0), Some(3.0), 4.0).unwrap();
    assert_eq!(w.duration, 2.0);
    assert!(!w.spans(4.0));
}

#[test]
fn window_outside_clip_is_rejected() {
    assert!(layer_window(Some(3.0), Some(5.0), 4.0).unwrap_err().is_validation());
    assert!(layer_window(Some(-1.0), None, 4.0).is_err());
    assert!(layer_window(Some(2.0), Some(2.0), 4.0).is_err());
    assert!(layer_window(Some(3.0), Some(1.0), 4.0).is_err());
}

#[test]
fn video_cut_clamps_to_file() {
    assert_eq!(clamp_video_cut(None, None, 10.0).unwrap(), (0.0, 10.0));
    assert_eq!(clamp_video_cut(Some(-2.0), Some(20.0), 10.0).unwrap(), (0.0, 10.0));
    assert_eq!(clamp_video_cut(Some(2.0), Some(0.0), 10.0).unwrap(), (2.0, 10.0));
    let err = clamp_video_cut(Some(12.0), None, 10.0).unwrap_err();
    assert!(err.to_string().contains("cutFrom"));
}

#[test]
fn audio_cut_defaults_to_clip_length() {
    assert_eq!(clamp_audio_cut(Some(1.0), None, 10.0, 3.0).unwrap(), (1.0, 4.0));
    assert_eq!(clamp_audio_cut(Some(8.0), None, 10.0, 3.0).unwrap(), (8.0, 10.0));
    assert!(clamp_audio_cut(Some(10.0), None, 10.0, 3.0).is_err());
}

#[test]
fn transitions_clamp_to_half_of_neighbours() {
    let safe = safe_transition_durations(&[4.0, 3.0, 1.0], &[1.0, 2.0, 5.0]);
    assert_eq!(safe, vec![1.0, 0.5, 0.0]);
}

#[test]
fn offsets_accumulate_overlaps() {
    let durations = [4.0, 3.0, 2.0];
    let safe = safe_transition_durations(&durations, &[1.0, 0.5, 1.0]);
    assert_eq!(clip_offsets(&durations, &safe), vec![0.0, 3.0, 5.5]);
    assert_eq!(total_duration(&durations, &safe), 7.5);
}
