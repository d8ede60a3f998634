use crate::foundation::error::ClipreelResult;
use crate::gpu::shader::{FragmentShader, TextureId, UniformValue};

/// Opaque vertex buffer handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub u64);

/// Opaque linked program handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u64);

/// Full-viewport triangle covering the quad `[-1, 1]^2`.
pub const FULLSCREEN_TRIANGLE: [f32; 6] = [-1.0, -1.0, -1.0, 4.0, 4.0, -1.0];

/// Minimal GPU context used by transition blending.
///
/// Handles are not reclaimed automatically. Callers pair every `create_*` with the matching
/// `delete_*`, normally through the guards in [`crate::gpu::guard`].
pub trait GpuDevice: Send + Sync {
    /// Drawing surface size in pixels.
    fn viewport(&self) -> (u32, u32);

    /// Upload a vertex buffer.
    fn create_buffer(&self, vertices: &[f32]) -> ClipreelResult<BufferId>;
    /// Release a vertex buffer.
    fn delete_buffer(&self, id: BufferId);

    /// Compile and link `shader`. Uniforms start at their declared defaults.
    fn create_program(&self, shader: &FragmentShader) -> ClipreelResult<ProgramId>;
    /// Release a program.
    fn delete_program(&self, id: ProgramId);

    /// Upload a `width x height` RGBA8 texture.
    fn create_texture(&self, width: u32, height: u32, rgba: &[u8]) -> ClipreelResult<TextureId>;
    /// Release a texture.
    fn delete_texture(&self, id: TextureId);

    /// Bind `value` to uniform `name`. Undeclared names and type mismatches are validation errors.
    fn set_uniform(&self, program: ProgramId, name: &str, value: UniformValue)
    -> ClipreelResult<()>;

    /// Draw `program` over the viewport with `from`/`to` bound as the transition inputs.
    fn draw(
        &self,
        program: ProgramId,
        buffer: BufferId,
        from: TextureId,
        to: TextureId,
        progress: f32,
    ) -> ClipreelResult<()>;

    /// Copy the drawing surface into `out` as RGBA8.
    fn read_pixels(&self, out: &mut [u8]) -> ClipreelResult<()>;

    /// Number of buffers, programs and textures currently alive.
    fn live_handles(&self) -> usize;
}
