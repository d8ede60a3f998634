use serde_json::{Map, Value};

use crate::foundation::error::{ClipreelError, ClipreelResult};
use crate::gpu::shader::{FragmentShader, UniformKind};
use crate::scene::model::TransitionSpec;
use crate::transition::catalog;
use crate::transition::ease::Easing;

/// Default `acrossfade` curve.
pub const DEFAULT_AUDIO_CURVE: &str = "tri";

/// A transition after name resolution, ready for planning and blending.
#[derive(Clone, Debug)]
pub struct ResolvedTransition {
    /// Canonical name (`random` and aliases already replaced).
    pub name: Option<String>,
    /// Duration in seconds. Clamped by the planner to the safe duration.
    pub duration: f64,
    /// Easing applied to progress before blending.
    pub easing: Easing,
    /// Uniform values for the program.
    pub params: Map<String, Value>,
    /// `acrossfade` curve for the outgoing clip.
    pub audio_out_curve: String,
    /// `acrossfade` curve for the incoming clip.
    pub audio_in_curve: String,
    pub(crate) shader: Option<&'static FragmentShader>,
}

impl Default for ResolvedTransition {
    fn default() -> Self {
        Self::none()
    }
}

impl ResolvedTransition {
    /// Zero-length hard cut.
    pub fn none() -> Self {
        Self {
            name: None,
            duration: 0.0,
            easing: Easing::Linear,
            params: Map::new(),
            audio_out_curve: DEFAULT_AUDIO_CURVE.to_owned(),
            audio_in_curve: DEFAULT_AUDIO_CURVE.to_owned(),
            shader: None,
        }
    }

    /// Resolve a merged transition request.
    ///
    /// `None` or the last clip yield a zero-length transition. `random` draws from the curated
    /// set, directional aliases become `directional` with a `direction` parameter and
    /// `easeOutExpo`, and `dummy` keeps the duration without a blend program.
    pub fn resolve(
        spec: Option<&TransitionSpec>,
        is_last_clip: bool,
        rng: &mut fastrand::Rng,
    ) -> ClipreelResult<Self> {
        let Some(spec) = spec else {
            return Ok(Self::none());
        };
        if is_last_clip {
            return Ok(Self::none());
        }

        let duration = spec.duration.unwrap_or(0.0);
        if !duration.is_finite() || duration < 0.0 {
            return Err(ClipreelError::validation(format!(
                "transition duration must be >= 0, got {duration}"
            )));
        }
        if duration > 0.0 && spec.name.as_deref().is_none_or(str::is_empty) {
            return Err(ClipreelError::validation(
                "please specify transition name or set duration to 0",
            ));
        }

        let mut name = spec.name.clone().filter(|n| !n.is_empty());
        if name.as_deref() == Some("random") {
            let pick = catalog::RANDOM_SET[rng.usize(..catalog::RANDOM_SET.len())];
            name = Some(pick.to_owned());
        }

        let mut params = spec.params.clone().unwrap_or_default();
        let mut easing = match spec.easing.as_deref() {
            None => Easing::Linear,
            Some(e) => Easing::from_name(e).unwrap_or_else(|| {
                tracing::warn!(easing = e, "unknown easing, using linear");
                Easing::Linear
            }),
        };
        if let Some((canonical, direction)) = name.as_deref().and_then(catalog::alias) {
            name = Some(canonical.to_owned());
            params.insert("direction".to_owned(), serde_json::json!(direction));
            easing = Easing::EaseOutExpo;
        }

        let shader = match name.as_deref() {
            None | Some("dummy") => None,
            Some(n) => Some(catalog::find(n).ok_or_else(|| {
                ClipreelError::validation(format!("transition not found: {n}"))
            })?),
        };
        if let Some(shader) = shader {
            check_params(shader, &params)?;
        }

        Ok(Self {
            name,
            duration,
            easing,
            params,
            audio_out_curve: spec
                .audio_out_curve
                .clone()
                .unwrap_or_else(|| DEFAULT_AUDIO_CURVE.to_owned()),
            audio_in_curve: spec
                .audio_in_curve
                .clone()
                .unwrap_or_else(|| DEFAULT_AUDIO_CURVE.to_owned()),
            shader,
        })
    }

    /// Return `true` when blending runs a program rather than a hard cut.
    pub fn has_program(&self) -> bool {
        self.shader.is_some()
    }

    /// Apply the easing to raw progress.
    pub fn ease(&self, progress: f64) -> f64 {
        self.easing.apply(progress)
    }
}

/// Check that every supplied parameter matches the declared uniform type.
fn check_params(shader: &FragmentShader, params: &Map<String, Value>) -> ClipreelResult<()> {
    for decl in shader.uniforms {
        let Some(v) = params.get(decl.name) else {
            continue;
        };
        let ok = match decl.kind {
            UniformKind::Float => v.is_number(),
            UniformKind::Int => v.is_i64(),
            UniformKind::Bool => v.is_boolean(),
            UniformKind::Vec2 => is_float_array(v, 2),
            UniformKind::Vec3 => is_float_array(v, 3),
            UniformKind::Vec4 => is_float_array(v, 4),
            UniformKind::Sampler2D => v.as_str().is_some_and(|s| !s.is_empty()),
        };
        if !ok {
            return Err(ClipreelError::validation(format!(
                "transition '{}' param '{}' must be a {}, got {v}",
                shader.name,
                decl.name,
                decl.kind.label()
            )));
        }
    }
    Ok(())
}

fn is_float_array(v: &Value, n: usize) -> bool {
    v.as_array()
        .is_some_and(|a| a.len() == n && a.iter().all(Value::is_number))
}

#[cfg(test)]
#[path = "../../tests/unit/transition/resolve.rs"]
mod tests;
