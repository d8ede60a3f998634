use rayon::prelude::*;

use crate::foundation::error::{ClipreelError, ClipreelResult};
use crate::foundation::math::over_premul;

/// Premultiplied RGBA8 image owned by a layer source.
#[derive(Clone, Debug, PartialEq)]
pub struct PremulImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub data: Vec<u8>,
}

impl PremulImage {
    /// Wrap `data`, checking its length.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> ClipreelResult<Self> {
        if width == 0 || height == 0 {
            return Err(ClipreelError::evaluation("image width/height must be > 0"));
        }
        if data.len() != width as usize * height as usize * 4 {
            return Err(ClipreelError::evaluation(format!(
                "image buffer has {} bytes, expected {}",
                data.len(),
                width as usize * height as usize * 4
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    fn sample(&self, x: f32, y: f32) -> [f32; 4] {
        let w = self.width as i64;
        let h = self.height as i64;
        let fx = x - 0.5;
        let fy = y - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let px = |xi: i64, yi: i64| -> [f32; 4] {
            let xi = xi.clamp(0, w - 1) as usize;
            let yi = yi.clamp(0, h - 1) as usize;
            let i = (yi * self.width as usize + xi) * 4;
            [
                f32::from(self.data[i]),
                f32::from(self.data[i + 1]),
                f32::from(self.data[i + 2]),
                f32::from(self.data[i + 3]),
            ]
        };
        let (x0, y0) = (x0 as i64, y0 as i64);
        let a = px(x0, y0);
        let b = px(x0 + 1, y0);
        let c = px(x0, y0 + 1);
        let d = px(x0 + 1, y0 + 1);
        let mut out = [0.0; 4];
        for i in 0..4 {
            let top = a[i] + (b[i] - a[i]) * tx;
            let bottom = c[i] + (d[i] - c[i]) * tx;
            out[i] = top + (bottom - top) * ty;
        }
        out
    }
}

/// Axis-aligned destination rectangle in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub w: f64,
    /// Height.
    pub h: f64,
}

impl DrawRect {
    /// Rectangle of size `w x h` centered on `(cx, cy)`.
    pub fn centered(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self {
            x: cx - w / 2.0,
            y: cy - h / 2.0,
            w,
            h,
        }
    }
}

/// Draw `src` scaled into `rect` over a `width x height` premultiplied canvas.
///
/// Pixels outside the canvas are clipped. `opacity` scales the source alpha.
pub fn draw_image(
    canvas: &mut [u8],
    width: u32,
    height: u32,
    src: &PremulImage,
    rect: DrawRect,
    opacity: f32,
) -> ClipreelResult<()> {
    if canvas.len() != width as usize * height as usize * 4 {
        return Err(ClipreelError::evaluation("canvas does not match its geometry"));
    }
    if !(rect.w > 0.0 && rect.h > 0.0) || opacity <= 0.0 {
        return Ok(());
    }
    let x0 = rect.x.floor().max(0.0) as usize;
    let y0 = rect.y.floor().max(0.0) as usize;
    let x1 = ((rect.x + rect.w).ceil().min(f64::from(width))).max(0.0) as usize;
    let y1 = ((rect.y + rect.h).ceil().min(f64::from(height))).max(0.0) as usize;
    if x0 >= x1 || y0 >= y1 {
        return Ok(());
    }
    let sx = f64::from(src.width) / rect.w;
    let sy = f64::from(src.height) / rect.h;
    let op = opacity.clamp(0.0, 1.0);
    let row_len = width as usize * 4;

    canvas
        .par_chunks_mut(row_len)
        .enumerate()
        .skip(y0)
        .take(y1 - y0)
        .for_each(|(y, row)| {
            let cy = y as f64 + 0.5;
            if cy < rect.y || cy >= rect.y + rect.h {
                return;
            }
            let v = ((cy - rect.y) * sy) as f32;
            for x in x0..x1 {
                let cx = x as f64 + 0.5;
                if cx < rect.x || cx >= rect.x + rect.w {
                    continue;
                }
                let u = ((cx - rect.x) * sx) as f32;
                let s = src.sample(u, v);
                let px = [
                    (s[0] * op).round().clamp(0.0, 255.0) as u8,
                    (s[1] * op).round().clamp(0.0, 255.0) as u8,
                    (s[2] * op).round().clamp(0.0, 255.0) as u8,
                    (s[3] * op).round().clamp(0.0, 255.0) as u8,
                ];
                let i = x * 4;
                let out = over_premul([row[i], row[i + 1], row[i + 2], row[i + 3]], px);
                row[i..i + 4].copy_from_slice(&out);
            }
        });
    Ok(())
}

/// Resample `src` to exactly `w x h`.
pub fn resize(src: &PremulImage, w: u32, h: u32) -> ClipreelResult<PremulImage> {
    let w = w.max(1);
    let h = h.max(1);
    let mut out = vec![0u8; w as usize * h as usize * 4];
    draw_image(
        &mut out,
        w,
        h,
        src,
        DrawRect {
            x: 0.0,
            y: 0.0,
            w: f64::from(w),
            h: f64::from(h),
        },
        1.0,
    )?;
    PremulImage::new(w, h, out)
}

/// Blurred copy of `src` covering `w x h`, used behind letterboxed media.
pub fn blurred_cover(src: &PremulImage, w: u32, h: u32) -> ClipreelResult<PremulImage> {
    const DOWNSCALE: u32 = 8;
    let small_w = (w / DOWNSCALE).max(1);
    let small_h = (h / DOWNSCALE).max(1);
    let scale = (f64::from(small_w) / f64::from(src.width))
        .max(f64::from(small_h) / f64::from(src.height));
    let cover_w = f64::from(src.width) * scale;
    let cover_h = f64::from(src.height) * scale;

    let mut small = vec![0u8; small_w as usize * small_h as usize * 4];
    draw_image(
        &mut small,
        small_w,
        small_h,
        src,
        DrawRect::centered(
            f64::from(small_w) / 2.0,
            f64::from(small_h) / 2.0,
            cover_w,
            cover_h,
        ),
        1.0,
    )?;
    let blurred = blur_rgba8_premul(&small, small_w, small_h, 3, 2.0)?;
    resize(&PremulImage::new(small_w, small_h, blurred)?, w, h)
}

/// Separable gaussian blur of a premultiplied RGBA8 buffer with clamp-to-edge sampling.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> ClipreelResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| ClipreelError::evaluation("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(ClipreelError::evaluation(
            "blur_rgba8_premul expects src matching width*height*4",
        ));
    }
    if radius == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    horizontal_pass(src, &mut tmp, width, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> ClipreelResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ClipreelError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(ClipreelError::evaluation("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    let acc: i64 = weights.iter().map(|w| i64::from(*w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let row_len = width as usize * 4;
    dst.par_chunks_mut(row_len)
        .zip(src.par_chunks(row_len))
        .for_each(|(out_row, in_row)| {
            for x in 0..w {
                let mut acc = [0u64; 4];
                for (ki, &kw) in k.iter().enumerate() {
                    let sx = (x + ki as i32 - radius).clamp(0, w - 1) as usize * 4;
                    for c in 0..4 {
                        acc[c] += u64::from(kw) * u64::from(in_row[sx + c]);
                    }
                }
                let o = x as usize * 4;
                for c in 0..4 {
                    out_row[o + c] = q16_to_u8(acc[c]);
                }
            }
        });
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as usize;
    let h = height as i32;
    dst.par_chunks_mut(w * 4)
        .enumerate()
        .for_each(|(y, out_row)| {
            for x in 0..w {
                let mut acc = [0u64; 4];
                for (ki, &kw) in k.iter().enumerate() {
                    let sy = (y as i32 + ki as i32 - radius).clamp(0, h - 1) as usize;
                    let idx = (sy * w + x) * 4;
                    for c in 0..4 {
                        acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                    }
                }
                for c in 0..4 {
                    out_row[x * 4 + c] = q16_to_u8(acc[c]);
                }
            }
        });
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

/// Rasterize an SVG document to a `width x height` premultiplied RGBA8 buffer.
pub fn rasterize_svg(
    svg: &str,
    width: u32,
    height: u32,
    opts: &usvg::Options<'_>,
) -> ClipreelResult<Vec<u8>> {
    let tree = usvg::Tree::from_str(svg, opts)
        .map_err(|e| ClipreelError::evaluation(format!("parse svg layer: {e}")))?;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| ClipreelError::evaluation("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(&tree, xform, &mut pixmap.as_mut());
    Ok(pixmap.take())
}

#[cfg(test)]
#[path = "../../tests/unit/source/raster.rs"]
mod tests;
