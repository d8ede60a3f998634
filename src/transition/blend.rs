use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::{FrameGeometry, RGBA_CHANNELS};
use crate::foundation::error::{ClipreelError, ClipreelResult};
use crate::gpu::device::{FULLSCREEN_TRIANGLE, GpuDevice};
use crate::gpu::guard::{BufferGuard, ProgramGuard, TextureGuard};
use crate::gpu::shader::{FragmentShader, UniformKind, UniformValue};
use crate::gpu::software::SoftwareDevice;
use crate::transition::ease::Easing;
use crate::transition::resolve::ResolvedTransition;

enum BoundParam {
    Value(UniformValue),
    Image {
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    },
}

/// Per-transition frame blender.
///
/// Each [`Blender::blend`] call allocates its vertex buffer, program and textures through guards,
/// so every handle is released before the call returns, on success or error.
pub struct Blender {
    device: Arc<dyn GpuDevice>,
    geometry: FrameGeometry,
    easing: Easing,
    shader: Option<&'static FragmentShader>,
    params: Vec<(&'static str, BoundParam)>,
}

impl std::fmt::Debug for Blender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blender")
            .field("geometry", &self.geometry)
            .field("easing", &self.easing)
            .field("shader", &self.shader.map(|s| s.name))
            .finish_non_exhaustive()
    }
}

impl ResolvedTransition {
    /// Blender drawing on a [`SoftwareDevice`] sized to `geometry`.
    pub fn create_blender(&self, geometry: FrameGeometry) -> ClipreelResult<Blender> {
        let device = SoftwareDevice::new(geometry.width, geometry.height)?;
        self.create_blender_on(Arc::new(device), geometry)
    }

    /// Blender drawing on `device`.
    pub fn create_blender_on(
        &self,
        device: Arc<dyn GpuDevice>,
        geometry: FrameGeometry,
    ) -> ClipreelResult<Blender> {
        if geometry.channels != RGBA_CHANNELS {
            return Err(ClipreelError::validation(format!(
                "blending expects {RGBA_CHANNELS} channels, got {}",
                geometry.channels
            )));
        }
        if device.viewport() != (geometry.width, geometry.height) {
            return Err(ClipreelError::validation(
                "gpu viewport does not match the frame geometry",
            ));
        }
        let mut params = Vec::new();
        if let Some(shader) = self.shader {
            for decl in shader.uniforms {
                let Some(v) = self.params.get(decl.name) else {
                    continue;
                };
                params.push((decl.name, bind_param(shader, decl.name, decl.kind, v)?));
            }
        }
        Ok(Blender {
            device,
            geometry,
            easing: self.easing,
            shader: self.shader,
            params,
        })
    }
}

fn bind_param(
    shader: &FragmentShader,
    name: &str,
    kind: UniformKind,
    v: &serde_json::Value,
) -> ClipreelResult<BoundParam> {
    let mismatch = || {
        ClipreelError::validation(format!(
            "transition '{}' param '{name}' must be a {}, got {v}",
            shader.name,
            kind.label()
        ))
    };
    let floats = |n: usize| -> ClipreelResult<Vec<f32>> {
        let arr = v.as_array().filter(|a| a.len() == n).ok_or_else(mismatch)?;
        arr.iter()
            .map(|x| x.as_f64().map(|f| f as f32).ok_or_else(mismatch))
            .collect()
    };
    let value = match kind {
        UniformKind::Float => UniformValue::Float(v.as_f64().ok_or_else(mismatch)? as f32),
        UniformKind::Int => {
            let i = v.as_i64().ok_or_else(mismatch)?;
            UniformValue::Int(i32::try_from(i).map_err(|_| mismatch())?)
        }
        UniformKind::Bool => UniformValue::Bool(v.as_bool().ok_or_else(mismatch)?),
        UniformKind::Vec2 => {
            let f = floats(2)?;
            UniformValue::Vec2([f[0], f[1]])
        }
        UniformKind::Vec3 => {
            let f = floats(3)?;
            UniformValue::Vec3([f[0], f[1], f[2]])
        }
        UniformKind::Vec4 => {
            let f = floats(4)?;
            UniformValue::Vec4([f[0], f[1], f[2], f[3]])
        }
        UniformKind::Sampler2D => {
            let path = v.as_str().ok_or_else(mismatch)?;
            let img = image::open(path)
                .with_context(|| format!("load transition texture '{path}'"))?
                .to_rgba8();
            return Ok(BoundParam::Image {
                width: img.width(),
                height: img.height(),
                rgba: img.into_raw(),
            });
        }
    };
    Ok(BoundParam::Value(value))
}

impl Blender {
    /// Frame geometry this blender accepts.
    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    /// Blend `from` into `to` at raw `progress` in `[0, 1]`; easing is applied here.
    ///
    /// Without a program the result is `to` once the eased progress passes `0.5`, else `from`.
    pub fn blend(&self, from: &[u8], to: &[u8], progress: f64) -> ClipreelResult<Vec<u8>> {
        let len = self.geometry.frame_len();
        if from.len() != len || to.len() != len {
            return Err(ClipreelError::evaluation(format!(
                "blend expects two {len}-byte frames, got {} and {}",
                from.len(),
                to.len()
            )));
        }
        let eased = self.easing.apply(progress);
        let Some(shader) = self.shader else {
            return Ok(if eased > 0.5 { to.to_vec() } else { from.to_vec() });
        };

        let dev: &dyn GpuDevice = self.device.as_ref();
        let (w, h) = (self.geometry.width, self.geometry.height);
        let buffer = BufferGuard::new(dev, &FULLSCREEN_TRIANGLE)?;
        let program = ProgramGuard::new(dev, shader)?;
        let from_tex = TextureGuard::new(dev, w, h, from)?;
        let to_tex = TextureGuard::new(dev, w, h, to)?;

        let mut samplers = Vec::new();
        for (name, param) in &self.params {
            match param {
                BoundParam::Value(v) => dev.set_uniform(program.id(), name, *v)?,
                BoundParam::Image {
                    width,
                    height,
                    rgba,
                } => {
                    let tex = TextureGuard::new(dev, *width, *height, rgba)?;
                    dev.set_uniform(program.id(), name, UniformValue::Sampler(tex.id()))?;
                    samplers.push(tex);
                }
            }
        }

        dev.draw(
            program.id(),
            buffer.id(),
            from_tex.id(),
            to_tex.id(),
            eased as f32,
        )?;
        let mut out = vec![0u8; len];
        dev.read_pixels(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transition/blend.rs"]
mod tests;
