use std::sync::Mutex;

use super::*;
use crate::scene::layer::{AudioLayer, FillColorLayer};
use crate::transition::resolve::ResolvedTransition;

fn geometry() -> FrameGeometry {
    FrameGeometry::rgba(Canvas {
        width: 4,
        height: 2,
    })
}

fn window(start: f64, stop: f64) -> LayerWindow {
    LayerWindow {
        start,
        stop,
        duration: stop - start,
    }
}

fn processed(kind: LayerKind, w: LayerWindow) -> ProcessedLayer {
    ProcessedLayer {
        kind,
        window: w,
        speed_factor: 1.0,
        cut: None,
        media: None,
    }
}

fn fill(color: &str) -> LayerKind {
    LayerKind::FillColor(FillColorLayer {
        color: Some(color.to_owned()),
    })
}

fn factory() -> ClipSourceFactory {
    ClipSourceFactory::new(
        geometry(),
        "25",
        Arc::new(FontRegistry::empty()),
        "ffmpeg",
        false,
    )
}

#[derive(Default)]
struct Calls {
    draws: Vec<(f64, f64)>,
    closes: usize,
}

struct Recorder(Arc<Mutex<Calls>>);

impl LayerSource for Recorder {
    fn draw(&mut self, _canvas: &mut [u8], progress: f64, time: f64) -> ClipreelResult<()> {
        self.0.lock().unwrap().draws.push((progress, time));
        Ok(())
    }

    fn close(&mut self) {
        self.0.lock().unwrap().closes += 1;
    }
}

#[test]
fn window_progress_is_inclusive() {
    let w = window(1.0, 3.0);
    assert_eq!(window_progress(&w, 1.0), Some(0.0));
    assert_eq!(window_progress(&w, 2.0), Some(0.5));
    assert_eq!(window_progress(&w, 3.0), Some(1.0));
    assert_eq!(window_progress(&w, 0.5), None);
    assert_eq!(window_progress(&w, 3.5), None);
}

#[test]
fn layers_draw_only_inside_their_window() {
    let calls = Arc::new(Mutex::new(Calls::default()));
    let mut src = ClipFrameSource::new(
        geometry(),
        vec![(window(1.0, 2.0), Box::new(Recorder(calls.clone())) as Box<dyn LayerSource>)],
    );
    for t in [0.0, 1.0, 1.5, 2.5] {
        assert!(src.read_next_frame(t).unwrap().is_some());
    }
    let c = calls.lock().unwrap();
    assert_eq!(c.draws, vec![(0.0, 0.0), (0.5, 0.5)]);
}

#[test]
fn close_is_idempotent_and_stops_frames() {
    let calls = Arc::new(Mutex::new(Calls::default()));
    let mut src = ClipFrameSource::new(
        geometry(),
        vec![(window(0.0, 1.0), Box::new(Recorder(calls.clone())) as Box<dyn LayerSource>)],
    );
    src.close();
    src.close();
    assert_eq!(calls.lock().unwrap().closes, 1);
    assert!(src.read_next_frame(0.0).unwrap().is_none());
}

#[test]
fn factory_skips_audio_and_stacks_bottom_first() {
    let clip = ProcessedClip {
        layers: vec![
            processed(fill("#ff0000"), window(0.0, 2.0)),
            processed(
                LayerKind::Audio(AudioLayer {
                    path: "a.mp3".to_owned(),
                    ..AudioLayer::default()
                }),
                window(0.0, 2.0),
            ),
            processed(fill("#0000ff"), window(1.0, 2.0)),
        ],
        duration: 2.0,
        transition: ResolvedTransition::none(),
    };
    let mut src = factory().create(0, &clip).unwrap();

    let early = src.read_next_frame(0.5).unwrap().unwrap();
    assert!(early.chunks_exact(4).all(|p| p == [255, 0, 0, 255]));
    let late = src.read_next_frame(1.5).unwrap().unwrap();
    assert!(late.chunks_exact(4).all(|p| p == [0, 0, 255, 255]));
    src.close();
}

#[test]
fn unexpanded_alias_is_rejected() {
    let clip = ProcessedClip {
        layers: vec![processed(LayerKind::RainbowColors, window(0.0, 1.0))],
        duration: 1.0,
        transition: ResolvedTransition::none(),
    };
    assert!(factory().create(0, &clip).is_err());
}

#[test]
fn unprobed_video_is_an_error() {
    let clip = ProcessedClip {
        layers: vec![processed(
            LayerKind::Video(crate::scene::layer::VideoLayer {
                path: "v.mp4".to_owned(),
                ..Default::default()
            }),
            window(0.0, 1.0),
        )],
        duration: 1.0,
        transition: ResolvedTransition::none(),
    };
    assert!(factory().create(0, &clip).is_err());
}
