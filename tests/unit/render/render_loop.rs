use std::sync::Mutex;

use super::*;
use crate::encode::sink::InMemorySink;
use crate::foundation::core::Canvas;
use crate::scene::model::TransitionSpec;
use crate::transition::resolve::ResolvedTransition;

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const COLORS: [[u8; 4]; 3] = [RED, BLUE, [0, 255, 0, 255]];

fn geometry() -> FrameGeometry {
    FrameGeometry::rgba(Canvas {
        width: 2,
        height: 2,
    })
}

fn fps() -> Fps {
    Fps::whole(10).unwrap()
}

fn transition(name: &str, duration: f64) -> ResolvedTransition {
    let spec = TransitionSpec {
        name: Some(name.to_owned()),
        duration: Some(duration),
        ..TransitionSpec::default()
    };
    ResolvedTransition::resolve(Some(&spec), false, &mut fastrand::Rng::with_seed(1)).unwrap()
}

fn clip(duration: f64, transition: ResolvedTransition) -> ProcessedClip {
    ProcessedClip {
        layers: Vec::new(),
        duration,
        transition,
    }
}

fn scenario_a(name: &str) -> Vec<ProcessedClip> {
    vec![
        clip(4.0, transition(name, 1.0)),
        clip(3.0, ResolvedTransition::none()),
    ]
}

#[derive(Default)]
struct Log {
    created: Vec<usize>,
    reads: Vec<(usize, f64)>,
    closes: Vec<usize>,
}

#[derive(Clone, Default)]
struct Script {
    /// (clip, read number) pairs that return no frame.
    missing: Vec<(usize, usize)>,
    /// (clip, read number) that fails.
    fail: Option<(usize, usize)>,
}

struct ScriptedSource {
    clip: usize,
    reads: usize,
    script: Script,
    log: Arc<Mutex<Log>>,
}

impl FrameSource for ScriptedSource {
    fn read_next_frame(&mut self, time: f64) -> ClipreelResult<Option<Vec<u8>>> {
        let n = self.reads;
        self.reads += 1;
        self.log.lock().unwrap().reads.push((self.clip, time));
        if self.script.fail == Some((self.clip, n)) {
            return Err(ClipreelError::evaluation("decoder died"));
        }
        if self.script.missing.contains(&(self.clip, n)) {
            return Ok(None);
        }
        Ok(Some(COLORS[self.clip % COLORS.len()].repeat(4)))
    }

    fn close(&mut self) {
        self.log.lock().unwrap().closes.push(self.clip);
    }
}

#[derive(Default)]
struct ScriptedFactory {
    script: Script,
    log: Arc<Mutex<Log>>,
}

impl FrameSourceFactory for ScriptedFactory {
    fn create(
        &self,
        clip_index: usize,
        _clip: &ProcessedClip,
    ) -> ClipreelResult<Box<dyn FrameSource>> {
        self.log.lock().unwrap().created.push(clip_index);
        Ok(Box::new(ScriptedSource {
            clip: clip_index,
            reads: 0,
            script: self.script.clone(),
            log: self.log.clone(),
        }))
    }
}

fn solid(frame: &[u8], px: [u8; 4]) -> bool {
    frame.chunks_exact(4).all(|p| p == px)
}

#[test]
fn two_clips_with_fade_write_sixty_frames() {
    let clips = scenario_a("fade");
    let factory = ScriptedFactory::default();
    let mut sink = InMemorySink::new();
    let rl = RenderLoop::new(&clips, geometry(), fps());
    assert_eq!(rl.planned_frames(), 60);

    let stats = rl.run(&factory, &mut sink, None).unwrap();
    assert_eq!(stats.frames_written, 60);
    assert_eq!(stats.blended_frames, 10);
    assert_eq!(stats.dropped_frames, 0);

    assert!(sink.is_ended());
    let frames = sink.frames();
    assert_eq!(frames.len(), 60);
    assert!(frames.iter().enumerate().all(|(i, (idx, _))| *idx == i as u64));
    assert!(frames[..30].iter().all(|(_, f)| solid(f, RED)));
    assert!(frames[40..].iter().all(|(_, f)| solid(f, BLUE)));
    let mid = &frames[35].1;
    assert!(!solid(mid, RED) && !solid(mid, BLUE));

    let log = factory.log.lock().unwrap();
    assert_eq!(log.created, vec![0, 1]);
    let a_reads: Vec<f64> = log.reads.iter().filter(|r| r.0 == 0).map(|r| r.1).collect();
    let b_reads: Vec<f64> = log.reads.iter().filter(|r| r.0 == 1).map(|r| r.1).collect();
    assert_eq!(a_reads.len(), 40);
    assert_eq!(b_reads.len(), 30);
    assert_eq!(b_reads[0], 0.0);
    assert!((b_reads[10] - 1.0).abs() < 1e-9);
    assert!(b_reads.windows(2).all(|w| w[0] < w[1]));
    let mut closes = log.closes.clone();
    closes.sort_unstable();
    assert_eq!(closes, vec![0, 1]);
}

#[test]
fn dummy_transition_cuts_at_the_midpoint() {
    let clips = scenario_a("dummy");
    let factory = ScriptedFactory::default();
    let mut sink = InMemorySink::new();
    RenderLoop::new(&clips, geometry(), fps())
        .run(&factory, &mut sink, None)
        .unwrap();
    let frames = sink.frames();
    assert!(frames[30..36].iter().all(|(_, f)| solid(f, RED)));
    assert!(frames[36..40].iter().all(|(_, f)| solid(f, BLUE)));
}

#[test]
fn hard_cut_reads_the_next_clip_from_its_start() {
    let clips = vec![
        clip(1.0, ResolvedTransition::none()),
        clip(1.0, ResolvedTransition::none()),
    ];
    let factory = ScriptedFactory::default();
    let mut sink = InMemorySink::new();
    let stats = RenderLoop::new(&clips, geometry(), fps())
        .run(&factory, &mut sink, None)
        .unwrap();
    assert_eq!(stats.frames_written, 20);
    assert_eq!(stats.blended_frames, 0);
    let log = factory.log.lock().unwrap();
    let b_first = log.reads.iter().find(|r| r.0 == 1).unwrap();
    assert_eq!(b_first.1, 0.0);
}

#[test]
fn dropped_frame_reuses_the_previous_frame() {
    let clips = vec![clip(1.0, ResolvedTransition::none())];
    let factory = ScriptedFactory {
        script: Script {
            missing: vec![(0, 3)],
            fail: None,
        },
        ..ScriptedFactory::default()
    };
    let mut sink = InMemorySink::new();
    let stats = RenderLoop::new(&clips, geometry(), fps())
        .run(&factory, &mut sink, None)
        .unwrap();
    assert_eq!(stats.frames_written, 10);
    assert_eq!(stats.dropped_frames, 1);
    assert!(solid(&sink.frames()[3].1, RED));
}

#[test]
fn first_frame_missing_yields_blank() {
    let clips = vec![clip(0.5, ResolvedTransition::none())];
    let factory = ScriptedFactory {
        script: Script {
            missing: vec![(0, 0)],
            fail: None,
        },
        ..ScriptedFactory::default()
    };
    let mut sink = InMemorySink::new();
    RenderLoop::new(&clips, geometry(), fps())
        .run(&factory, &mut sink, None)
        .unwrap();
    assert!(solid(&sink.frames()[0].1, [0, 0, 0, 0]));
}

#[test]
fn missing_to_frame_passes_current_through() {
    let clips = scenario_a("fade");
    let factory = ScriptedFactory {
        script: Script {
            missing: vec![(1, 0)],
            fail: None,
        },
        ..ScriptedFactory::default()
    };
    let mut sink = InMemorySink::new();
    let stats = RenderLoop::new(&clips, geometry(), fps())
        .run(&factory, &mut sink, None)
        .unwrap();
    assert_eq!(stats.missing_to_frames, 1);
    assert_eq!(stats.blended_frames, 9);
    assert!(solid(&sink.frames()[30].1, RED));
}

#[test]
fn source_error_closes_sources_and_aborts_sink() {
    let clips = scenario_a("fade");
    let factory = ScriptedFactory {
        script: Script {
            missing: Vec::new(),
            fail: Some((0, 5)),
        },
        ..ScriptedFactory::default()
    };
    let mut sink = InMemorySink::new();
    let err = RenderLoop::new(&clips, geometry(), fps())
        .run(&factory, &mut sink, None)
        .unwrap_err();
    assert!(matches!(err, ClipreelError::Evaluation(_)));
    assert!(sink.is_aborted());
    assert!(!sink.is_ended());
    assert_eq!(sink.frames().len(), 5);
    let mut closes = factory.log.lock().unwrap().closes.clone();
    closes.sort_unstable();
    assert_eq!(closes, vec![0, 1]);
}

#[test]
fn cancel_flag_stops_the_loop() {
    let clips = scenario_a("fade");
    let factory = ScriptedFactory::default();
    let mut sink = InMemorySink::new();
    let flag = CancelFlag::new();
    flag.cancel();
    let err = RenderLoop::new(&clips, geometry(), fps())
        .with_cancel_flag(flag)
        .run(&factory, &mut sink, None)
        .unwrap_err();
    assert!(matches!(err, ClipreelError::Cancelled));
    assert!(sink.is_aborted());
    assert!(sink.frames().is_empty());
    assert_eq!(factory.log.lock().unwrap().closes.len(), 2);
}

#[test]
fn audio_path_reaches_the_sink() {
    let clips = vec![clip(0.2, ResolvedTransition::none())];
    let mut sink = InMemorySink::new();
    RenderLoop::new(&clips, geometry(), fps())
        .run(
            &ScriptedFactory::default(),
            &mut sink,
            Some(PathBuf::from("mix.flac")),
        )
        .unwrap();
    let cfg = sink.config().unwrap();
    assert_eq!(cfg.audio.as_deref(), Some(std::path::Path::new("mix.flac")));
    assert_eq!((cfg.width, cfg.height), (2, 2));
}

#[test]
fn empty_timeline_is_rejected() {
    let mut sink = InMemorySink::new();
    let err = RenderLoop::new(&[], geometry(), fps())
        .run(&ScriptedFactory::default(), &mut sink, None)
        .unwrap_err();
    assert!(err.is_validation());
}
