use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use rayon::prelude::*;

use crate::foundation::error::{ClipreelError, ClipreelResult};
use crate::gpu::device::{BufferId, GpuDevice, ProgramId};
use crate::gpu::shader::{
    FragmentShader, ShaderContext, TextureId, TextureView, UniformValue,
};

struct Program {
    shader: FragmentShader,
    values: Vec<(&'static str, Option<UniformValue>)>,
}

struct Texture {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

#[derive(Default)]
struct State {
    next_id: u64,
    buffers: HashSet<u64>,
    programs: HashMap<u64, Program>,
    textures: HashMap<u64, Texture>,
    target: Vec<u8>,
}

impl State {
    fn alloc_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

fn texture_view(textures: &HashMap<u64, Texture>, id: TextureId) -> ClipreelResult<TextureView<'_>> {
    textures
        .get(&id.0)
        .map(|t| TextureView {
            width: t.width,
            height: t.height,
            data: &t.data,
        })
        .ok_or_else(|| ClipreelError::evaluation(format!("unknown texture {}", id.0)))
}

/// CPU implementation of [`GpuDevice`].
///
/// Programs run per pixel on the rayon pool, one task per output row.
pub struct SoftwareDevice {
    width: u32,
    height: u32,
    state: Mutex<State>,
}

impl SoftwareDevice {
    /// Device with a `width x height` drawing surface.
    pub fn new(width: u32, height: u32) -> ClipreelResult<Self> {
        if width == 0 || height == 0 {
            return Err(ClipreelError::validation(
                "gpu viewport width/height must be > 0",
            ));
        }
        let len = width as usize * height as usize * 4;
        Ok(Self {
            width,
            height,
            state: Mutex::new(State {
                target: vec![0u8; len],
                ..State::default()
            }),
        })
    }

    fn render_into(
        &self,
        st: &State,
        target: &mut [u8],
        program: ProgramId,
        from: TextureId,
        to: TextureId,
        progress: f32,
    ) -> ClipreelResult<()> {
        let prog = st
            .programs
            .get(&program.0)
            .ok_or_else(|| ClipreelError::evaluation(format!("unknown program {}", program.0)))?;

        let mut uniforms = Vec::with_capacity(prog.values.len());
        let mut samplers = Vec::new();
        for (name, value) in &prog.values {
            let Some(value) = value else {
                return Err(ClipreelError::validation(format!(
                    "uniform '{name}' of transition '{}' is not set",
                    prog.shader.name
                )));
            };
            if let UniformValue::Sampler(id) = value {
                samplers.push((*id, texture_view(&st.textures, *id)?));
            }
            uniforms.push((*name, *value));
        }

        let ctx = ShaderContext {
            progress,
            ratio: self.width as f32 / self.height as f32,
            from: texture_view(&st.textures, from)?,
            to: texture_view(&st.textures, to)?,
            uniforms,
            samplers,
        };
        let main = prog.shader.main;
        let (w, h) = (self.width as usize, self.height as usize);
        target
            .par_chunks_mut(w * 4)
            .enumerate()
            .for_each(|(y, row)| {
                let v = (y as f32 + 0.5) / h as f32;
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    let u = (x as f32 + 0.5) / w as f32;
                    let c = main(&ctx, [u, v]);
                    for (dst, src) in px.iter_mut().zip(c) {
                        *dst = (src.clamp(0.0, 1.0) * 255.0).round() as u8;
                    }
                }
            });
        Ok(())
    }

    fn lock(&self) -> ClipreelResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| ClipreelError::evaluation("software gpu state poisoned"))
    }
}

impl GpuDevice for SoftwareDevice {
    fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn create_buffer(&self, vertices: &[f32]) -> ClipreelResult<BufferId> {
        if vertices.is_empty() || !vertices.len().is_multiple_of(2) {
            return Err(ClipreelError::evaluation(
                "vertex buffer expects non-empty vec2 data",
            ));
        }
        let mut st = self.lock()?;
        let id = st.alloc_id();
        st.buffers.insert(id);
        Ok(BufferId(id))
    }

    fn delete_buffer(&self, id: BufferId) {
        if let Ok(mut st) = self.state.lock() {
            st.buffers.remove(&id.0);
        }
    }

    fn create_program(&self, shader: &FragmentShader) -> ClipreelResult<ProgramId> {
        let mut st = self.lock()?;
        let id = st.alloc_id();
        let values = shader.uniforms.iter().map(|u| (u.name, u.default)).collect();
        st.programs.insert(
            id,
            Program {
                shader: *shader,
                values,
            },
        );
        Ok(ProgramId(id))
    }

    fn delete_program(&self, id: ProgramId) {
        if let Ok(mut st) = self.state.lock() {
            st.programs.remove(&id.0);
        }
    }

    fn create_texture(&self, width: u32, height: u32, rgba: &[u8]) -> ClipreelResult<TextureId> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || rgba.len() != expected {
            return Err(ClipreelError::evaluation(format!(
                "texture upload expects {width}x{height} rgba8 ({expected} bytes), got {}",
                rgba.len()
            )));
        }
        let mut st = self.lock()?;
        let id = st.alloc_id();
        st.textures.insert(
            id,
            Texture {
                width,
                height,
                data: rgba.to_vec(),
            },
        );
        Ok(TextureId(id))
    }

    fn delete_texture(&self, id: TextureId) {
        if let Ok(mut st) = self.state.lock() {
            st.textures.remove(&id.0);
        }
    }

    fn set_uniform(
        &self,
        program: ProgramId,
        name: &str,
        value: UniformValue,
    ) -> ClipreelResult<()> {
        let mut st = self.lock()?;
        let prog = st
            .programs
            .get_mut(&program.0)
            .ok_or_else(|| ClipreelError::evaluation(format!("unknown program {}", program.0)))?;
        let shader_name = prog.shader.name;
        let decl = prog.shader.uniform(name).ok_or_else(|| {
            ClipreelError::validation(format!(
                "transition '{shader_name}' has no uniform named '{name}'"
            ))
        })?;
        if decl.kind != value.kind() {
            return Err(ClipreelError::validation(format!(
                "uniform '{name}' of transition '{shader_name}' expects {}, got {}",
                decl.kind.label(),
                value.kind().label()
            )));
        }
        if let Some(slot) = prog.values.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = Some(value);
        }
        Ok(())
    }

    fn draw(
        &self,
        program: ProgramId,
        buffer: BufferId,
        from: TextureId,
        to: TextureId,
        progress: f32,
    ) -> ClipreelResult<()> {
        let mut st = self.lock()?;
        if !st.buffers.contains(&buffer.0) {
            return Err(ClipreelError::evaluation(format!("unknown buffer {}", buffer.0)));
        }
        let mut target = std::mem::take(&mut st.target);
        let result = self.render_into(&st, &mut target, program, from, to, progress);
        st.target = target;
        result
    }

    fn read_pixels(&self, out: &mut [u8]) -> ClipreelResult<()> {
        let st = self.lock()?;
        if out.len() != st.target.len() {
            return Err(ClipreelError::evaluation(format!(
                "read_pixels expects {} bytes, got {}",
                st.target.len(),
                out.len()
            )));
        }
        out.copy_from_slice(&st.target);
        Ok(())
    }

    fn live_handles(&self) -> usize {
        self.state
            .lock()
            .map(|st| st.buffers.len() + st.programs.len() + st.textures.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gpu/software.rs"]
mod tests;
