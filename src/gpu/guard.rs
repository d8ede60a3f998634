//! Scoped ownership of device handles. Dropping a guard releases its handle.

use crate::foundation::error::ClipreelResult;
use crate::gpu::device::{BufferId, GpuDevice, ProgramId};
use crate::gpu::shader::{FragmentShader, TextureId};

/// Vertex buffer released on drop.
pub struct BufferGuard<'a> {
    device: &'a dyn GpuDevice,
    id: BufferId,
}

impl<'a> BufferGuard<'a> {
    /// Upload `vertices` and take ownership of the handle.
    pub fn new(device: &'a dyn GpuDevice, vertices: &[f32]) -> ClipreelResult<Self> {
        let id = device.create_buffer(vertices)?;
        Ok(Self { device, id })
    }

    /// Underlying handle.
    pub fn id(&self) -> BufferId {
        self.id
    }
}

impl Drop for BufferGuard<'_> {
    fn drop(&mut self) {
        self.device.delete_buffer(self.id);
    }
}

/// Program released on drop.
pub struct ProgramGuard<'a> {
    device: &'a dyn GpuDevice,
    id: ProgramId,
}

impl<'a> ProgramGuard<'a> {
    /// Link `shader` and take ownership of the handle.
    pub fn new(device: &'a dyn GpuDevice, shader: &FragmentShader) -> ClipreelResult<Self> {
        let id = device.create_program(shader)?;
        Ok(Self { device, id })
    }

    /// Underlying handle.
    pub fn id(&self) -> ProgramId {
        self.id
    }
}

impl Drop for ProgramGuard<'_> {
    fn drop(&mut self) {
        self.device.delete_program(self.id);
    }
}

/// Texture released on drop.
pub struct TextureGuard<'a> {
    device: &'a dyn GpuDevice,
    id: TextureId,
}

impl<'a> TextureGuard<'a> {
    /// Upload an RGBA8 image and take ownership of the handle.
    pub fn new(
        device: &'a dyn GpuDevice,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> ClipreelResult<Self> {
        let id = device.create_texture(width, height, rgba)?;
        Ok(Self { device, id })
    }

    /// Underlying handle.
    pub fn id(&self) -> TextureId {
        self.id
    }
}

impl Drop for TextureGuard<'_> {
    fn drop(&mut self) {
        self.device.delete_texture(self.id);
    }
}
