use super::*;
use crate::foundation::core::Canvas;
use crate::gpu::device::{BufferId, ProgramId};
use crate::gpu::shader::TextureId;
use crate::scene::model::TransitionSpec;

fn geometry(w: u32, h: u32) -> FrameGeometry {
    FrameGeometry::rgba(Canvas {
        width: w,
        height: h,
    })
}

fn resolved(spec: TransitionSpec) -> ResolvedTransition {
    let mut rng = fastrand::Rng::with_seed(1);
    ResolvedTransition::resolve(Some(&spec), false, &mut rng).unwrap()
}

/// Software device whose draw always fails.
struct BrokenDraw(SoftwareDevice);

impl GpuDevice for BrokenDraw {
    fn viewport(&self) -> (u32, u32) {
        self.0.viewport()
    }
    fn create_buffer(&self, v: &[f32]) -> ClipreelResult<BufferId> {
        self.0.create_buffer(v)
    }
    fn delete_buffer(&self, id: BufferId) {
        self.0.delete_buffer(id)
    }
    fn create_program(&self, s: &FragmentShader) -> ClipreelResult<ProgramId> {
        self.0.create_program(s)
    }
    fn delete_program(&self, id: ProgramId) {
        self.0.delete_program(id)
    }
    fn create_texture(&self, w: u32, h: u32, rgba: &[u8]) -> ClipreelResult<TextureId> {
        self.0.create_texture(w, h, rgba)
    }
    fn delete_texture(&self, id: TextureId) {
        self.0.delete_texture(id)
    }
    fn set_uniform(&self, p: ProgramId, n: &str, v: UniformValue) -> ClipreelResult<()> {
        self.0.set_uniform(p, n, v)
    }
    fn draw(
        &self,
        _program: ProgramId,
        _buffer: BufferId,
        _from: TextureId,
        _to: TextureId,
        _progress: f32,
    ) -> ClipreelResult<()> {
        Err(ClipreelError::evaluation("draw lost"))
    }
    fn read_pixels(&self, out: &mut [u8]) -> ClipreelResult<()> {
        self.0.read_pixels(out)
    }
    fn live_handles(&self) -> usize {
        self.0.live_handles()
    }
}

#[test]
fn fade_blends_and_releases_handles() {
    let t = resolved(TransitionSpec::named("fade", 1.0));
    let device = Arc::new(SoftwareDevice::new(2, 2).unwrap());
    let blender = t.create_blender_on(device.clone(), geometry(2, 2)).unwrap();
    let from = [0u8, 0, 0, 255].repeat(4);
    let to = [100u8, 200, 50, 255].repeat(4);
    for _ in 0..3 {
        let out = blender.blend(&from, &to, 0.5).unwrap();
        assert_eq!(&out[0..4], &[50, 100, 25, 255]);
    }
    assert_eq!(device.live_handles(), 0);
}

#[test]
fn failed_draw_still_releases_handles() {
    let t = resolved(TransitionSpec::named("fade", 1.0));
    let device = Arc::new(BrokenDraw(SoftwareDevice::new(2, 2).unwrap()));
    let blender = t.create_blender_on(device.clone(), geometry(2, 2)).unwrap();
    let frame = [1u8, 2, 3, 255].repeat(4);
    let err = blender.blend(&frame, &frame, 0.3).unwrap_err();
    assert!(err.to_string().contains("draw lost"));
    assert_eq!(device.live_handles(), 0);
}

#[test]
fn dummy_is_a_hard_cut_at_eased_midpoint() {
    let t = resolved(TransitionSpec::named("dummy", 1.0));
    assert!(!t.has_program());
    let blender = t.create_blender(geometry(1, 1)).unwrap();
    let from = [1u8, 1, 1, 255];
    let to = [9u8, 9, 9, 255];
    assert_eq!(blender.blend(&from, &to, 0.5).unwrap(), from.to_vec());
    assert_eq!(blender.blend(&from, &to, 0.51).unwrap(), to.to_vec());

    let mut spec = TransitionSpec::named("dummy", 1.0);
    spec.easing = Some("easeOutExpo".to_owned());
    let eased = resolved(spec).create_blender(geometry(1, 1)).unwrap();
    // easeOutExpo(0.1) == 0.5, so 0.11 is already past the midpoint.
    assert_eq!(eased.blend(&from, &to, 0.1).unwrap(), from.to_vec());
    assert_eq!(eased.blend(&from, &to, 0.11).unwrap(), to.to_vec());
}

#[test]
fn params_are_bound_as_uniforms() {
    let mut spec = TransitionSpec::named("fadecolor", 1.0);
    spec.params = Some(
        serde_json::json!({ "color": [1.0, 0.0, 0.0], "colorPhase": 0.5 })
            .as_object()
            .cloned()
            .unwrap(),
    );
    let blender = resolved(spec).create_blender(geometry(1, 1)).unwrap();
    let black = [0u8, 0, 0, 255];
    let out = blender.blend(&black, &black, 0.5).unwrap();
    assert_eq!(out, vec![255, 0, 0, 255]);
}

#[test]
fn sampler_param_loads_an_image() {
    let path = std::env::temp_dir().join(format!("clipreel_luma_{}.png", std::process::id()));
    image::save_buffer_with_format(
        &path,
        &[255u8, 255, 255, 255],
        1,
        1,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .unwrap();

    let mut spec = TransitionSpec::named("luma", 1.0);
    spec.params = Some(
        serde_json::json!({ "luminanceTexture": path.to_string_lossy() })
            .as_object()
            .cloned()
            .unwrap(),
    );
    let blender = resolved(spec).create_blender(geometry(1, 1)).unwrap();
    let from = [10u8, 10, 10, 255];
    let to = [90u8, 90, 90, 255];
    assert_eq!(blender.blend(&from, &to, 0.5).unwrap(), from.to_vec());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn frame_size_mismatch_is_rejected() {
    let t = resolved(TransitionSpec::named("fade", 1.0));
    let blender = t.create_blender(geometry(2, 2)).unwrap();
    assert!(blender.blend(&[0u8; 4], &[0u8; 16], 0.5).is_err());
}
