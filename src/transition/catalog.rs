//! Built-in transition programs.

use crate::gpu::shader::{
    FragmentShader, ShaderContext, UniformDecl, UniformKind, UniformValue, Vec2, Vec4, fract, mix,
    mix4, scale_about_center, smoothstep, step,
};

const fn decl(name: &'static str, kind: UniformKind, default: UniformValue) -> UniformDecl {
    UniformDecl {
        name,
        kind,
        default: Some(default),
    }
}

fn add_rgb(c: Vec4, rgb: [f32; 3], k: f32) -> Vec4 {
    [c[0] + rgb[0] * k, c[1] + rgb[1] * k, c[2] + rgb[2] * k, c[3] + 1.0]
}

fn grayscale(c: Vec4) -> Vec4 {
    let g = 0.2126 * c[0] + 0.7152 * c[1] + 0.0722 * c[2];
    [g, g, g, 1.0]
}

fn fade(ctx: &ShaderContext<'_>, uv: Vec2) -> Vec4 {
    mix4(ctx.get_from(uv), ctx.get_to(uv), ctx.progress)
}

fn fadegrayscale(ctx: &ShaderContext<'_>, uv: Vec2) -> Vec4 {
    let intensity = ctx.float("intensity");
    let p = ctx.progress;
    let fc = ctx.get_from(uv);
    let tc = ctx.get_to(uv);
    mix4(
        mix4(grayscale(fc), fc, smoothstep(1.0 - intensity, 0.0, p)),
        mix4(grayscale(tc), tc, smoothstep(intensity, 1.0, p)),
        p,
    )
}

fn fadecolor(ctx: &ShaderContext<'_>, uv: Vec2) -> Vec4 {
    let [r, g, b] = ctx.vec3("color");
    let color = [r, g, b, 1.0];
    let phase = ctx.float("colorPhase");
    let p = ctx.progress;
    mix4(
        mix4(color, ctx.get_from(uv), smoothstep(1.0 - phase, 0.0, p)),
        mix4(color, ctx.get_to(uv), smoothstep(phase, 1.0, p)),
        p,
    )
}

fn directional(ctx: &ShaderContext<'_>, uv: Vec2) -> Vec4 {
    let d = ctx.vec2("direction");
    let sign = |v: f32| {
        if v > 0.0 {
            1.0
        } else if v < 0.0 {
            -1.0
        } else {
            0.0
        }
    };
    let p = [uv[0] + ctx.progress * sign(d[0]), uv[1] + ctx.progress * sign(d[1])];
    let f = [fract(p[0]), fract(p[1])];
    let inside = step(0.0, p[1]) * step(p[1], 1.0) * step(0.0, p[0]) * step(p[0], 1.0);
    mix4(ctx.get_to(f), ctx.get_from(f), inside)
}

fn directionalwarp(ctx: &ShaderContext<'_>, uv: Vec2) -> Vec4 {
    const SMOOTHNESS: f32 = 0.5;
    let dir = ctx.vec2("direction");
    let len = (dir[0] * dir[0] + dir[1] * dir[1]).sqrt().max(f32::EPSILON);
    let mut v = [dir[0] / len, dir[1] / len];
    let l1 = (v[0].abs() + v[1].abs()).max(f32::EPSILON);
    v = [v[0] / l1, v[1] / l1];
    let d = v[0] * 0.5 + v[1] * 0.5;
    let m = 1.0
        - smoothstep(
            -SMOOTHNESS,
            0.0,
            v[0] * uv[0] + v[1] * uv[1] - (d - 0.5 + ctx.progress * (1.0 + SMOOTHNESS)),
        );
    mix4(
        ctx.get_from(scale_about_center(uv, 1.0 - m)),
        ctx.get_to(scale_about_center(uv, m)),
        m,
    )
}

fn crosswarp(ctx: &ShaderContext<'_>, uv: Vec2) -> Vec4 {
    let x = smoothstep(0.0, 1.0, ctx.progress * 2.0 + uv[0] - 1.0);
    mix4(
        ctx.get_from(scale_about_center(uv, 1.0 - x)),
        ctx.get_to(scale_about_center(uv, x)),
        x,
    )
}

fn burn(ctx: &ShaderContext<'_>, uv: Vec2) -> Vec4 {
    let color = ctx.vec3("color");
    let p = ctx.progress;
    mix4(
        add_rgb(ctx.get_from(uv), color, p),
        add_rgb(ctx.get_to(uv), color, 1.0 - p),
        p,
    )
}

fn simplezoom(ctx: &ShaderContext<'_>, uv: Vec2) -> Vec4 {
    let quick = ctx.float("zoom_quickness").clamp(0.2, 1.0);
    let p = ctx.progress;
    let zoomed = scale_about_center(uv, 1.0 - smoothstep(0.0, quick, p));
    mix4(
        ctx.get_from(zoomed),
        ctx.get_to(uv),
        smoothstep(quick - 0.2, 1.0, p),
    )
}

fn linearblur(ctx: &ShaderContext<'_>, uv: Vec2) -> Vec4 {
    const PASSES: usize = 6;
    let disp = ctx.float("intensity") * (0.5 - (0.5 - ctx.progress).abs());
    let mut c1 = [0.0f32; 4];
    let mut c2 = [0.0f32; 4];
    for xi in 0..PASSES {
        let x = xi as f32 / PASSES as f32 - 0.5;
        for yi in 0..PASSES {
            let y = yi as f32 / PASSES as f32 - 0.5;
            let p = [uv[0] + disp * x, uv[1] + disp * y];
            let a = ctx.get_from(p);
            let b = ctx.get_to(p);
            for i in 0..4 {
                c1[i] += a[i];
                c2[i] += b[i];
            }
        }
    }
    let n = (PASSES * PASSES) as f32;
    let c1 = c1.map(|v| v / n);
    let c2 = c2.map(|v| v / n);
    mix4(c1, c2, ctx.progress)
}

fn circleopen(ctx: &ShaderContext<'_>, uv: Vec2) -> Vec4 {
    let smoothness = ctx.float("smoothness");
    let opening = ctx.boolean("opening");
    let x = if opening { ctx.progress } else { 1.0 - ctx.progress };
    let dist = ((uv[0] - 0.5).powi(2) + (uv[1] - 0.5).powi(2)).sqrt();
    let m = smoothstep(
        -smoothness,
        0.0,
        std::f32::consts::SQRT_2 * dist - x * (1.0 + smoothness),
    );
    mix4(
        ctx.get_from(uv),
        ctx.get_to(uv),
        if opening { 1.0 - m } else { m },
    )
}

fn radial(ctx: &ShaderContext<'_>, uv: Vec2) -> Vec4 {
    let smoothness = ctx.float("smoothness");
    let rp = [uv[0] * 2.0 - 1.0, uv[1] * 2.0 - 1.0];
    let angle = rp[1].atan2(rp[0]);
    mix4(
        ctx.get_to(uv),
        ctx.get_from(uv),
        smoothstep(
            0.0,
            smoothness,
            angle - (ctx.progress - 0.5) * std::f32::consts::PI * 2.5,
        ),
    )
}

fn dreamyzoom(ctx: &ShaderContext<'_>, uv: Vec2) -> Vec4 {
    // Radians per unit of `rotation`, as the reference program defines it.
    const DEG2RAD: f32 = 0.039_269_908;
    let rotation = ctx.float("rotation") * DEG2RAD;
    let scale = ctx.float("scale");
    let p = ctx.progress;
    let first_half = p < 0.5;
    let phase = if first_half { p * 2.0 } else { (p - 0.5) * 2.0 };
    let (angle_offset, new_scale, glow) = if first_half {
        (mix(0.0, rotation, phase), mix(1.0, scale, phase), phase)
    } else {
        (mix(-rotation, 0.0, phase), mix(scale, 1.0, phase), 1.0 - phase)
    };
    let ratio = ctx.ratio;
    let q = [(uv[0] - 0.5) / new_scale * ratio, (uv[1] - 0.5) / new_scale];
    let angle = q[1].atan2(q[0]) + angle_offset;
    let dist = (q[0] * q[0] + q[1] * q[1]).sqrt();
    let src = [angle.cos() * dist / ratio + 0.5, angle.sin() * dist + 0.5];
    let c = if first_half {
        ctx.get_from(src)
    } else {
        ctx.get_to(src)
    };
    c.map(|v| v + glow)
}

fn exponential_ease_in_out(t: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let t = t * 2.0;
    if t < 1.0 {
        0.5 * 2f32.powf(10.0 * (t - 1.0))
    } else {
        0.5 * (2.0 - 2f32.powf(-10.0 * (t - 1.0)))
    }
}

fn crosszoom(ctx: &ShaderContext<'_>, uv: Vec2) -> Vec4 {
    const SAMPLES: usize = 40;
    let p = ctx.progress;
    let center = [0.25 + 0.5 * p, 0.5];
    let dissolve = exponential_ease_in_out(p);
    let strength =
        -ctx.float("strength") / 2.0 * ((std::f32::consts::PI * p / 0.5).cos() - 1.0);
    let to_center = [center[0] - uv[0], center[1] - uv[1]];
    let offset = fract((uv[0] * 12.9898 + uv[1] * 78.233).sin() * 43_758.547);
    let mut color = [0.0f32; 3];
    let mut total = 0.0;
    for t in 0..=SAMPLES {
        let percent = (t as f32 + offset) / SAMPLES as f32;
        let weight = 4.0 * (percent - percent * percent);
        let at = [
            uv[0] + to_center[0] * percent * strength,
            uv[1] + to_center[1] * percent * strength,
        ];
        let c = mix4(ctx.get_from(at), ctx.get_to(at), dissolve);
        for i in 0..3 {
            color[i] += c[i] * weight;
        }
        total += weight;
    }
    let total = total.max(f32::EPSILON);
    [color[0] / total, color[1] / total, color[2] / total, 1.0]
}

fn wipe(ctx: &ShaderContext<'_>, uv: Vec2, edge: f32) -> Vec4 {
    mix4(ctx.get_from(uv), ctx.get_to(uv), step(edge, ctx.progress))
}

fn wipeleft(ctx: &ShaderContext<'_>, uv: Vec2) -> Vec4 {
    wipe(ctx, uv, 1.0 - uv[0])
}

fn wiperight(ctx: &ShaderContext<'_>, uv: Vec2) -> Vec4 {
    wipe(ctx, uv, uv[0])
}

fn wipeup(ctx: &ShaderContext<'_>, uv: Vec2) -> Vec4 {
    wipe(ctx, uv, uv[1])
}

fn wipedown(ctx: &ShaderContext<'_>, uv: Vec2) -> Vec4 {
    wipe(ctx, uv, 1.0 - uv[1])
}

fn luma(ctx: &ShaderContext<'_>, uv: Vec2) -> Vec4 {
    let l = ctx.texture("luminanceTexture", uv)[0];
    mix4(ctx.get_to(uv), ctx.get_from(uv), step(ctx.progress, l))
}

/// Every built-in transition program.
pub static CATALOG: &[FragmentShader] = &[
    FragmentShader {
        name: "fade",
        uniforms: &[],
        main: fade,
    },
    FragmentShader {
        name: "fadegrayscale",
        uniforms: &[decl("intensity", UniformKind::Float, UniformValue::Float(0.3))],
        main: fadegrayscale,
    },
    FragmentShader {
        name: "fadecolor",
        uniforms: &[
            decl("color", UniformKind::Vec3, UniformValue::Vec3([0.0, 0.0, 0.0])),
            decl("colorPhase", UniformKind::Float, UniformValue::Float(0.4)),
        ],
        main: fadecolor,
    },
    FragmentShader {
        name: "directional",
        uniforms: &[decl(
            "direction",
            UniformKind::Vec2,
            UniformValue::Vec2([0.0, 1.0]),
        )],
        main: directional,
    },
    FragmentShader {
        name: "directionalwarp",
        uniforms: &[decl(
            "direction",
            UniformKind::Vec2,
            UniformValue::Vec2([-1.0, 1.0]),
        )],
        main: directionalwarp,
    },
    FragmentShader {
        name: "crosswarp",
        uniforms: &[],
        main: crosswarp,
    },
    FragmentShader {
        name: "burn",
        uniforms: &[decl(
            "color",
            UniformKind::Vec3,
            UniformValue::Vec3([0.9, 0.4, 0.2]),
        )],
        main: burn,
    },
    FragmentShader {
        name: "simplezoom",
        uniforms: &[decl(
            "zoom_quickness",
            UniformKind::Float,
            UniformValue::Float(0.8),
        )],
        main: simplezoom,
    },
    FragmentShader {
        name: "linearblur",
        uniforms: &[decl("intensity", UniformKind::Float, UniformValue::Float(0.1))],
        main: linearblur,
    },
    FragmentShader {
        name: "circleopen",
        uniforms: &[
            decl("smoothness", UniformKind::Float, UniformValue::Float(0.3)),
            decl("opening", UniformKind::Bool, UniformValue::Bool(true)),
        ],
        main: circleopen,
    },
    FragmentShader {
        name: "radial",
        uniforms: &[decl("smoothness", UniformKind::Float, UniformValue::Float(1.0))],
        main: radial,
    },
    FragmentShader {
        name: "dreamyzoom",
        uniforms: &[
            decl("rotation", UniformKind::Float, UniformValue::Float(6.0)),
            decl("scale", UniformKind::Float, UniformValue::Float(1.2)),
        ],
        main: dreamyzoom,
    },
    FragmentShader {
        name: "crosszoom",
        uniforms: &[decl("strength", UniformKind::Float, UniformValue::Float(0.4))],
        main: crosszoom,
    },
    FragmentShader {
        name: "wipeleft",
        uniforms: &[],
        main: wipeleft,
    },
    FragmentShader {
        name: "wiperight",
        uniforms: &[],
        main: wiperight,
    },
    FragmentShader {
        name: "wipeup",
        uniforms: &[],
        main: wipeup,
    },
    FragmentShader {
        name: "wipedown",
        uniforms: &[],
        main: wipedown,
    },
    FragmentShader {
        name: "luma",
        uniforms: &[UniformDecl {
            name: "luminanceTexture",
            kind: UniformKind::Sampler2D,
            default: None,
        }],
        main: luma,
    },
];

/// Names `random` picks from.
pub const RANDOM_SET: &[&str] = &[
    "fade",
    "fadegrayscale",
    "directionalwarp",
    "crosswarp",
    "dreamyzoom",
    "burn",
    "crosszoom",
    "simplezoom",
    "linearblur",
    "directional-left",
    "directional-right",
    "directional-up",
    "directional-down",
];

/// Case-insensitive catalog lookup.
pub fn find(name: &str) -> Option<&'static FragmentShader> {
    CATALOG.iter().find(|s| s.name.eq_ignore_ascii_case(name))
}

/// Directional alias: canonical name plus the `direction` parameter.
pub fn alias(name: &str) -> Option<(&'static str, [f64; 2])> {
    match name {
        "directional-left" => Some(("directional", [1.0, 0.0])),
        "directional-right" => Some(("directional", [-1.0, 0.0])),
        "directional-down" => Some(("directional", [0.0, 1.0])),
        "directional-up" => Some(("directional", [0.0, -1.0])),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transition/catalog.rs"]
mod tests;
