use super::*;

#[test]
fn fps_parses_rational_whole_and_decimal() {
    assert_eq!(Fps::parse("30000/1001"), Some(Fps { num: 30000, den: 1001 }));
    assert_eq!(Fps::parse("25"), Some(Fps { num: 25, den: 1 }));
    assert_eq!(Fps::parse("29.97"), Some(Fps { num: 29970, den: 1000 }));
    assert_eq!(Fps::parse("0/0"), None);
    assert_eq!(Fps::parse("abc"), None);
    assert_eq!(Fps::parse("-5"), None);
}

#[test]
fn fps_round_trips_framerate_str() {
    assert_eq!(Fps::whole(10).unwrap().framerate_str(), "10");
    assert_eq!(Fps::new(30000, 1001).unwrap().framerate_str(), "30000/1001");
}

#[test]
fn secs_to_frames_rounds_to_nearest() {
    let fps = Fps::whole(10).unwrap();
    assert_eq!(fps.secs_to_frames_round(4.0), 40);
    assert_eq!(fps.secs_to_frames_round(0.26), 3);
    assert_eq!(fps.secs_to_frames_round(-1.0), 0);
}

#[test]
fn frame_len_uses_channels() {
    let g = FrameGeometry::rgba(Canvas {
        width: 4,
        height: 2,
    });
    assert_eq!(g.frame_len(), 32);
}
