//! Fragment programs evaluated by a [`GpuDevice`](crate::GpuDevice).
//!
//! A program is a plain Rust function run once per output pixel. Texture coordinates are
//! normalized to `[0, 1]` with the origin at the first row of the frame buffer, which is how a
//! frame uploaded row by row and read back with `glReadPixels` lines up.

/// Two-component vector.
pub type Vec2 = [f32; 2];
/// Three-component vector.
pub type Vec3 = [f32; 3];
/// Four-component vector (RGBA in `[0, 1]`).
pub type Vec4 = [f32; 4];

/// Opaque texture handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// Declared type of a uniform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformKind {
    /// `float`
    Float,
    /// `vec2`
    Vec2,
    /// `vec3`
    Vec3,
    /// `vec4`
    Vec4,
    /// `int`
    Int,
    /// `bool`
    Bool,
    /// `sampler2D`
    Sampler2D,
}

impl UniformKind {
    /// GLSL spelling of this type.
    pub fn label(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Sampler2D => "sampler2D",
        }
    }
}

/// Value bound to a uniform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    /// `float`
    Float(f32),
    /// `vec2`
    Vec2(Vec2),
    /// `vec3`
    Vec3(Vec3),
    /// `vec4`
    Vec4(Vec4),
    /// `int`
    Int(i32),
    /// `bool`
    Bool(bool),
    /// `sampler2D`
    Sampler(TextureId),
}

impl UniformValue {
    /// Kind of this value.
    pub fn kind(&self) -> UniformKind {
        match self {
            Self::Float(_) => UniformKind::Float,
            Self::Vec2(_) => UniformKind::Vec2,
            Self::Vec3(_) => UniformKind::Vec3,
            Self::Vec4(_) => UniformKind::Vec4,
            Self::Int(_) => UniformKind::Int,
            Self::Bool(_) => UniformKind::Bool,
            Self::Sampler(_) => UniformKind::Sampler2D,
        }
    }
}

/// One uniform declared by a program.
#[derive(Clone, Copy, Debug)]
pub struct UniformDecl {
    /// Uniform name.
    pub name: &'static str,
    /// Declared type.
    pub kind: UniformKind,
    /// Value used until the caller sets one. Samplers have none.
    pub default: Option<UniformValue>,
}

/// A transition program: declared uniforms plus the per-pixel function.
#[derive(Clone, Copy)]
pub struct FragmentShader {
    /// Catalog name.
    pub name: &'static str,
    /// Declared uniforms.
    pub uniforms: &'static [UniformDecl],
    /// Per-pixel function.
    pub main: fn(&ShaderContext<'_>, Vec2) -> Vec4,
}

impl std::fmt::Debug for FragmentShader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FragmentShader")
            .field("name", &self.name)
            .field("uniforms", &self.uniforms)
            .finish_non_exhaustive()
    }
}

impl FragmentShader {
    /// Declaration of uniform `name`.
    pub fn uniform(&self, name: &str) -> Option<&UniformDecl> {
        self.uniforms.iter().find(|u| u.name == name)
    }
}

/// Read-only RGBA8 texture view with bilinear clamp-to-edge sampling.
#[derive(Clone, Copy, Debug)]
pub struct TextureView<'a> {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8 data.
    pub data: &'a [u8],
}

impl TextureView<'_> {
    fn texel(&self, x: i64, y: i64) -> Vec4 {
        let x = x.clamp(0, i64::from(self.width) - 1) as usize;
        let y = y.clamp(0, i64::from(self.height) - 1) as usize;
        let i = (y * self.width as usize + x) * 4;
        match self.data.get(i..i + 4) {
            Some(p) => [
                f32::from(p[0]) / 255.0,
                f32::from(p[1]) / 255.0,
                f32::from(p[2]) / 255.0,
                f32::from(p[3]) / 255.0,
            ],
            None => [0.0; 4],
        }
    }

    /// Sample at normalized `uv`.
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        if self.width == 0 || self.height == 0 {
            return [0.0; 4];
        }
        let fx = uv[0] * self.width as f32 - 0.5;
        let fy = uv[1] * self.height as f32 - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);
        let a = self.texel(x0, y0);
        let b = self.texel(x0 + 1, y0);
        let c = self.texel(x0, y0 + 1);
        let d = self.texel(x0 + 1, y0 + 1);
        mix4(mix4(a, b, tx), mix4(c, d, tx), ty)
    }
}

/// Inputs visible to a program during one draw.
#[derive(Debug)]
pub struct ShaderContext<'a> {
    /// Transition progress in `[0, 1]`.
    pub progress: f32,
    /// Viewport aspect ratio (width / height).
    pub ratio: f32,
    pub(crate) from: TextureView<'a>,
    pub(crate) to: TextureView<'a>,
    pub(crate) uniforms: Vec<(&'static str, UniformValue)>,
    pub(crate) samplers: Vec<(TextureId, TextureView<'a>)>,
}

impl ShaderContext<'_> {
    /// Sample the outgoing frame.
    pub fn get_from(&self, uv: Vec2) -> Vec4 {
        self.from.sample(uv)
    }

    /// Sample the incoming frame.
    pub fn get_to(&self, uv: Vec2) -> Vec4 {
        self.to.sample(uv)
    }

    fn value(&self, name: &str) -> Option<UniformValue> {
        self.uniforms
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    /// `float` uniform, `0.0` when unbound.
    pub fn float(&self, name: &str) -> f32 {
        match self.value(name) {
            Some(UniformValue::Float(v)) => v,
            Some(UniformValue::Int(v)) => v as f32,
            _ => 0.0,
        }
    }

    /// `vec2` uniform, zero when unbound.
    pub fn vec2(&self, name: &str) -> Vec2 {
        match self.value(name) {
            Some(UniformValue::Vec2(v)) => v,
            _ => [0.0; 2],
        }
    }

    /// `vec3` uniform, zero when unbound.
    pub fn vec3(&self, name: &str) -> Vec3 {
        match self.value(name) {
            Some(UniformValue::Vec3(v)) => v,
            _ => [0.0; 3],
        }
    }

    /// `bool` uniform, `false` when unbound.
    pub fn boolean(&self, name: &str) -> bool {
        matches!(self.value(name), Some(UniformValue::Bool(true)))
    }

    /// Sample the `sampler2D` uniform `name`; transparent black when unbound.
    pub fn texture(&self, name: &str, uv: Vec2) -> Vec4 {
        let Some(UniformValue::Sampler(id)) = self.value(name) else {
            return [0.0; 4];
        };
        self.samplers
            .iter()
            .find(|(sid, _)| *sid == id)
            .map(|(_, view)| view.sample(uv))
            .unwrap_or([0.0; 4])
    }
}

/// GLSL `mix` on scalars.
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// GLSL `mix` on `vec4`.
pub fn mix4(a: Vec4, b: Vec4, t: f32) -> Vec4 {
    [
        mix(a[0], b[0], t),
        mix(a[1], b[1], t),
        mix(a[2], b[2], t),
        mix(a[3], b[3], t),
    ]
}

/// GLSL `smoothstep`, including reversed edges.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge0 == edge1 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// GLSL `step`.
pub fn step(edge: f32, x: f32) -> f32 {
    if x < edge { 0.0 } else { 1.0 }
}

/// GLSL `fract`.
pub fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// Scale `uv` around the center: `(uv - 0.5) * s + 0.5`.
pub fn scale_about_center(uv: Vec2, s: f32) -> Vec2 {
    [(uv[0] - 0.5) * s + 0.5, (uv[1] - 0.5) * s + 0.5]
}
