use super::*;

fn info(width: u32, height: u32) -> VideoInfo {
    VideoInfo {
        duration: 10.0,
        width,
        height,
        framerate_str: "30/1".to_owned(),
        rotation: None,
        codec_name: Some("h264".to_owned()),
    }
}

fn canvas() -> Canvas {
    Canvas {
        width: 1280,
        height: 720,
    }
}

fn layer(mode: ResizeMode) -> VideoLayer {
    VideoLayer {
        path: "in.mp4".to_owned(),
        resize_mode: Some(mode),
        ..VideoLayer::default()
    }
}

fn arg_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

#[test]
fn same_aspect_contain_fills_canvas() {
    let plan = decode_plan(
        &layer(ResizeMode::Contain),
        &info(1920, 1080),
        (0.0, 4.0),
        1.0,
        canvas(),
        "30",
    )
    .unwrap();
    assert_eq!((plan.frame_width, plan.frame_height), (1280, 720));
    assert_eq!(arg_after(&plan.args, "-vf"), Some("fps=30,scale=1280:720"));
    assert_eq!(plan.target.x, 0.0);
}

#[test]
fn portrait_contain_blur_is_pillarboxed() {
    let plan = decode_plan(
        &layer(ResizeMode::ContainBlur),
        &info(1080, 1920),
        (0.0, 4.0),
        1.0,
        canvas(),
        "30",
    )
    .unwrap();
    assert_eq!((plan.frame_width, plan.frame_height), (405, 720));
    assert_eq!(plan.target.x, 437.5);
    assert_eq!(plan.requested.w, 1280.0);
    assert_eq!(plan.frame_len(), 405 * 720 * 4);
}

#[test]
fn cover_scales_then_crops() {
    let plan = decode_plan(
        &layer(ResizeMode::Cover),
        &info(1080, 1920),
        (0.0, 4.0),
        1.0,
        canvas(),
        "30",
    )
    .unwrap();
    assert_eq!((plan.frame_width, plan.frame_height), (1280, 720));
    assert_eq!(
        arg_after(&plan.args, "-vf"),
        Some("fps=30,scale=1280:2276,crop=1280:720")
    );
}

#[test]
fn cut_and_speed_shape_the_input_args() {
    let plan = decode_plan(
        &layer(ResizeMode::Stretch),
        &info(640, 480),
        (2.0, 5.0),
        2.0,
        canvas(),
        "25",
    )
    .unwrap();
    assert_eq!(arg_after(&plan.args, "-ss"), Some("2"));
    assert_eq!(arg_after(&plan.args, "-t"), Some("6"));
    assert_eq!(
        arg_after(&plan.args, "-vf"),
        Some("setpts=2*PTS,fps=25,scale=1280:720")
    );
    assert_eq!(plan.args.last().map(String::as_str), Some("-"));
    assert_eq!(arg_after(&plan.args, "-pix_fmt"), Some("rgba"));
}

#[test]
fn zero_cut_from_skips_seek() {
    let plan = decode_plan(
        &layer(ResizeMode::Stretch),
        &info(640, 480),
        (0.0, 3.0),
        1.0,
        canvas(),
        "25",
    )
    .unwrap();
    assert!(!plan.args.iter().any(|a| a == "-ss"));
    assert_eq!(arg_after(&plan.args, "-t"), Some("3"));
}

#[test]
fn vp9_input_selects_libvpx_decoder() {
    let mut i = info(640, 480);
    i.codec_name = Some("vp9".to_owned());
    let plan = decode_plan(
        &layer(ResizeMode::Contain),
        &i,
        (0.0, 1.0),
        1.0,
        canvas(),
        "25",
    )
    .unwrap();
    let codec = plan.args.iter().position(|a| a == "libvpx-vp9").unwrap();
    let input = plan.args.iter().position(|a| a == "-i").unwrap();
    assert!(codec < input);
}

#[test]
fn relative_size_and_offset_place_the_layer() {
    let l = VideoLayer {
        width: Some(0.5),
        height: Some(0.5),
        left: Some(0.25),
        top: Some(0.5),
        ..layer(ResizeMode::Stretch)
    };
    let plan = decode_plan(&l, &info(640, 480), (0.0, 1.0), 1.0, canvas(), "25").unwrap();
    assert_eq!((plan.frame_width, plan.frame_height), (640, 360));
    assert_eq!((plan.target.x, plan.target.y), (320.0, 360.0));
}

#[test]
fn read_frame_distinguishes_clean_and_truncated_end() {
    let mut buf = [0u8; 4];
    let mut full = std::io::Cursor::new(vec![1u8, 2, 3, 4, 5, 6]);
    assert!(read_frame(&mut full, &mut buf).unwrap());
    assert_eq!(buf, [1, 2, 3, 4]);
    assert!(read_frame(&mut full, &mut buf).is_err());

    let mut empty = std::io::Cursor::new(Vec::<u8>::new());
    assert!(!read_frame(&mut empty, &mut buf).unwrap());
}
