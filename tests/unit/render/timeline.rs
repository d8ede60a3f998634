use super::*;

#[test]
fn two_clip_fade_boundary() {
    let b = BoundaryFrames::new(10.0, 4.0, Some(3.0), 1.0);
    assert_eq!(b.from_frames, 40);
    assert_eq!(b.to_frames, Some(30));
    assert_eq!(b.transition_frames, 10);
    assert_eq!(b.safe_frames, 10);

    assert_eq!(b.transition_frame_at(0), -30);
    assert!(!b.in_transition(29));
    assert!(b.in_transition(30));
    assert!(b.in_transition(39));
    assert!(!b.should_advance(39));
    assert!(b.should_advance(40));

    assert_eq!(b.progress(30), 0.0);
    assert_eq!(b.progress(35), 0.5);
    assert_eq!(b.progress(29), 0.0);
}

#[test]
fn overlap_is_clamped_to_half_of_the_shorter_clip() {
    let b = BoundaryFrames::new(10.0, 4.0, Some(1.5), 3.0);
    assert_eq!(b.safe_frames, 7);
    let b = BoundaryFrames::new(10.0, 0.9, Some(5.0), 3.0);
    assert_eq!(b.safe_frames, 4);
}

#[test]
fn last_clip_has_no_overlap() {
    let b = BoundaryFrames::new(25.0, 2.0, None, 0.0);
    assert_eq!(b.safe_frames, 0);
    assert!(!b.in_transition(49));
    assert!(b.should_advance(50));
}

#[test]
fn zero_frame_clip_advances_immediately() {
    let b = BoundaryFrames::new(25.0, 0.0, Some(1.0), 0.5);
    assert_eq!(b.from_frames, 0);
    assert!(b.should_advance(0));
}

#[test]
fn clip_time_scales_frame_index() {
    assert_eq!(clip_time(4.0, 20, 40), 2.0);
    assert_eq!(clip_time(4.0, 0, 0), 0.0);
}

#[test]
fn planned_frames_subtract_overlaps() {
    assert_eq!(planned_frame_count(10.0, &[(4.0, 1.0), (3.0, 0.0)]), 60);
    assert_eq!(planned_frame_count(10.0, &[(2.0, 0.0)]), 20);
    assert_eq!(
        planned_frame_count(25.0, &[(2.0, 0.5), (2.0, 0.5), (2.0, 0.0)]),
        150 - 2 * 13
    );
    assert_eq!(planned_frame_count(10.0, &[]), 0);
}
