use super::*;
use crate::encode::sink::InMemorySink;
use crate::plan::planner::ProcessedClip;
use crate::transition::resolve::ResolvedTransition;

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("clipreel_editor_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn config(dir: &Path, keep_tmp: bool) -> RenderConfig {
    let doc = serde_json::json!({
        "outPath": dir.join("out.mp4"),
        "width": 8,
        "height": 4,
        "fps": 10,
        "seed": 7,
        "keepTmp": keep_tmp,
        "defaults": { "transition": { "name": "fade", "duration": 0.5 } },
        "clips": [
            { "duration": 1, "layers": [{ "type": "fill-color", "color": "#ff0000" }] },
            { "duration": 1, "layers": [{ "type": "fill-color", "color": "#0000ff" }] }
        ]
    });
    RenderConfig::from_json_str(&doc.to_string()).unwrap()
}

fn editor(cfg: RenderConfig) -> Editor {
    Editor::new(cfg).with_fonts(Arc::new(FontRegistry::empty()))
}

fn tmp_dirs(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("clipreel-tmp-"))
        .count()
}

#[test]
fn renders_fill_clips_into_a_sink() {
    let dir = scratch("sink");
    let ed = editor(config(&dir, false));
    let mut sink = InMemorySink::new();
    let report = ed.render_into(&mut sink).unwrap();

    assert_eq!((report.canvas.width, report.canvas.height), (8, 4));
    assert_eq!(report.fps, Fps::whole(10).unwrap());
    assert!(!report.has_audio);
    assert_eq!(report.stats.frames_written, 15);
    assert_eq!(report.stats.blended_frames, 5);
    assert_eq!(sink.frames().len(), 15);
    assert!(sink.config().unwrap().audio.is_none());

    let first = &sink.frames()[0].1;
    assert!(first.chunks_exact(4).all(|p| p == [255, 0, 0, 255]));
    let last = &sink.frames()[14].1;
    assert!(last.chunks_exact(4).all(|p| p == [0, 0, 255, 255]));

    assert_eq!(tmp_dirs(&dir), 0);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn keep_tmp_leaves_the_scratch_dir() {
    let dir = scratch("keep");
    let ed = editor(config(&dir, true));
    ed.render_into(&mut InMemorySink::new()).unwrap();
    assert_eq!(tmp_dirs(&dir), 1);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn cancelled_render_removes_scratch_dir() {
    let dir = scratch("cancel");
    let flag = CancelFlag::new();
    flag.cancel();
    let ed = editor(config(&dir, false)).with_cancel_flag(flag);
    let mut sink = InMemorySink::new();
    let err = ed.render_into(&mut sink).unwrap_err();
    assert!(matches!(err, ClipreelError::Cancelled));
    assert!(sink.is_aborted());
    assert_eq!(tmp_dirs(&dir), 0);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn single_frame_writes_png_of_the_covering_clip() {
    let dir = scratch("frame");
    let ed = editor(config(&dir, false));
    let png = dir.join("frame.png");
    ed.render_single_frame(1.5, &png).unwrap();
    let img = image::open(&png).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (8, 4));
    assert_eq!(img.get_pixel(3, 2).0, [0, 0, 255, 255]);

    let err = ed.render_single_frame(5.0, &png).unwrap_err();
    assert!(err.is_validation());
    let _ = std::fs::remove_dir_all(&dir);
}

fn plain(duration: f64) -> ProcessedClip {
    ProcessedClip {
        layers: Vec::new(),
        duration,
        transition: ResolvedTransition::none(),
    }
}

#[test]
fn clip_at_uses_plain_cumulative_durations() {
    let plan = PlanOutput {
        clips: vec![plain(2.0), plain(3.0)],
        arbitrary_audio: Vec::new(),
    };
    assert_eq!(clip_at(&plan, 0.0), Some((0, 0.0)));
    assert_eq!(clip_at(&plan, 2.0), Some((1, 0.0)));
    assert_eq!(clip_at(&plan, 4.5), Some((1, 2.5)));
    assert_eq!(clip_at(&plan, 5.0), None);
    assert_eq!(clip_at(&plan, -1.0), None);
}

#[test]
fn png_output_is_unpremultiplied() {
    let dir = scratch("png");
    let png = dir.join("half.png");
    let canvas = Canvas {
        width: 1,
        height: 1,
    };
    write_png(&png, canvas, vec![100, 50, 0, 128]).unwrap();
    let px = image::open(&png).unwrap().to_rgba8().get_pixel(0, 0).0;
    assert_eq!(px, [199, 100, 0, 128]);
    let _ = std::fs::remove_dir_all(&dir);
}
