//! Fragment-program layers drawn on a [`GpuDevice`].

use std::sync::Arc;

use crate::foundation::core::Canvas;
use crate::foundation::error::{ClipreelError, ClipreelResult};
use crate::foundation::math::over_premul_in_place;
use crate::gpu::device::{FULLSCREEN_TRIANGLE, GpuDevice};
use crate::gpu::guard::{BufferGuard, ProgramGuard, TextureGuard};
use crate::gpu::shader::{FragmentShader, ShaderContext, Vec2, Vec4};
use crate::gpu::software::SoftwareDevice;
use crate::scene::layer::GlLayer;
use crate::source::frame::LayerSource;

fn rainbow_colors(ctx: &ShaderContext<'_>, uv: Vec2) -> Vec4 {
    let t = ctx.progress;
    let c = |x: f32, k: f32| 0.5 + 0.5 * (t + x + k).cos();
    [c(uv[0], 0.0), c(uv[1], 2.0), c(uv[0], 4.0), 1.0]
}

static PROGRAMS: &[FragmentShader] = &[FragmentShader {
    name: "rainbow-colors",
    uniforms: &[],
    main: rainbow_colors,
}];

/// Built-in layer program called `name`.
pub fn find_program(name: &str) -> Option<&'static FragmentShader> {
    PROGRAMS.iter().find(|p| p.name == name)
}

/// Names of every built-in layer program.
pub fn program_names() -> Vec<&'static str> {
    PROGRAMS.iter().map(|p| p.name).collect()
}

/// [`LayerSource`] running a layer program over the whole canvas.
///
/// The program sees `progress * speed` as its time input.
pub struct GlLayerSource {
    device: Arc<dyn GpuDevice>,
    program: &'static FragmentShader,
    speed: f64,
    frame: Vec<u8>,
}

impl GlLayerSource {
    /// Source for `layer` on a software device sized to `canvas`.
    pub fn new(layer: &GlLayer, canvas: Canvas) -> ClipreelResult<Self> {
        let device = SoftwareDevice::new(canvas.width, canvas.height)?;
        Self::with_device(layer, Arc::new(device))
    }

    /// Source for `layer` drawing on `device`.
    pub fn with_device(layer: &GlLayer, device: Arc<dyn GpuDevice>) -> ClipreelResult<Self> {
        let name = layer
            .shader
            .as_deref()
            .ok_or_else(|| ClipreelError::validation("gl layer needs a \"shader\" name"))?;
        let program = find_program(name)
            .ok_or_else(|| ClipreelError::validation(format!("unknown gl program: {name}")))?;
        let (w, h) = device.viewport();
        Ok(Self {
            device,
            program,
            speed: layer.speed.unwrap_or(1.0),
            frame: vec![0u8; w as usize * h as usize * 4],
        })
    }
}

impl LayerSource for GlLayerSource {
    fn draw(&mut self, canvas: &mut [u8], progress: f64, _time: f64) -> ClipreelResult<()> {
        let dev: &dyn GpuDevice = self.device.as_ref();
        let buffer = BufferGuard::new(dev, &FULLSCREEN_TRIANGLE)?;
        let program = ProgramGuard::new(dev, self.program)?;
        // Layer programs ignore their transition inputs.
        let blank = TextureGuard::new(dev, 1, 1, &[0, 0, 0, 0])?;
        dev.draw(
            program.id(),
            buffer.id(),
            blank.id(),
            blank.id(),
            (progress * self.speed) as f32,
        )?;
        dev.read_pixels(&mut self.frame)?;
        over_premul_in_place(canvas, &self.frame)
    }
}
