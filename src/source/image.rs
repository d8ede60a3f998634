use anyhow::Context;

use crate::foundation::core::Canvas;
use crate::foundation::error::ClipreelResult;
use crate::foundation::math::premultiply_in_place;
use crate::scene::layer::{
    ImageLayer, ImageOverlayLayer, Placement, ResizeMode, ZoomDirection,
};
use crate::source::frame::LayerSource;
use crate::source::kenburns::{DEFAULT_ZOOM_AMOUNT, pan_offset, zoom_scale};
use crate::source::raster::{DrawRect, PremulImage, blurred_cover, draw_image};

/// Decode an image file into premultiplied RGBA8.
pub fn load_premul_image(path: &str) -> ClipreelResult<PremulImage> {
    let img = image::open(path)
        .with_context(|| format!("decode image '{path}'"))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    let mut data = img.into_raw();
    premultiply_in_place(&mut data);
    PremulImage::new(w, h, data)
}

/// Size of `(iw, ih)` fitted to `(w, h)` by `mode`, then scaled by `scale`.
pub fn fitted_size(mode: ResizeMode, iw: f64, ih: f64, w: f64, h: f64, scale: f64) -> (f64, f64) {
    let ratio_w = w / iw;
    let ratio_h = h / ih;
    match mode {
        ResizeMode::Contain | ResizeMode::ContainBlur => {
            if ratio_w > ratio_h {
                (iw * h * scale / ih, h * scale)
            } else {
                (w * scale, ih * w * scale / iw)
            }
        }
        ResizeMode::Cover => {
            if ratio_w > ratio_h {
                (w * scale, ih * w * scale / iw)
            } else {
                (iw * h * scale / ih, h * scale)
            }
        }
        ResizeMode::Stretch => (w * scale, h * scale),
    }
}

/// Full-frame still image with a Ken Burns move.
pub struct ImageLayerSource {
    image: PremulImage,
    background: Option<PremulImage>,
    canvas: Canvas,
    mode: ResizeMode,
    direction: Option<ZoomDirection>,
    amount: f64,
}

impl ImageLayerSource {
    /// Load the image of `layer` for a `canvas`-sized clip.
    pub fn new(layer: &ImageLayer, canvas: Canvas) -> ClipreelResult<Self> {
        let image = load_premul_image(&layer.path)?;
        let mode = layer.resize_mode.unwrap_or_default();
        let background = match mode {
            ResizeMode::ContainBlur => Some(blurred_cover(&image, canvas.width, canvas.height)?),
            _ => None,
        };
        Ok(Self {
            image,
            background,
            canvas,
            mode,
            direction: layer.zoom_direction.or(Some(ZoomDirection::In)),
            amount: layer.zoom_amount.unwrap_or(DEFAULT_ZOOM_AMOUNT),
        })
    }
}

impl LayerSource for ImageLayerSource {
    fn draw(&mut self, canvas: &mut [u8], progress: f64, _time: f64) -> ClipreelResult<()> {
        let (cw, ch) = (self.canvas.width, self.canvas.height);
        let (w, h) = (f64::from(cw), f64::from(ch));
        if let Some(bg) = &self.background {
            draw_image(canvas, cw, ch, bg, DrawRect { x: 0.0, y: 0.0, w, h }, 1.0)?;
        }
        let scale = zoom_scale(self.direction, self.amount, progress);
        let pan = pan_offset(self.direction, self.amount, progress);
        let (dw, dh) = fitted_size(
            self.mode,
            f64::from(self.image.width),
            f64::from(self.image.height),
            w,
            h,
            scale,
        );
        draw_image(
            canvas,
            cw,
            ch,
            &self.image,
            DrawRect::centered(w / 2.0 + pan, h / 2.0, dw, dh),
            1.0,
        )
    }
}

/// Positioned image drawn over the layers below it.
pub struct ImageOverlaySource {
    image: PremulImage,
    canvas: Canvas,
    layer: ImageOverlayLayer,
}

impl ImageOverlaySource {
    /// Load the image of `layer`.
    pub fn new(layer: &ImageOverlayLayer, canvas: Canvas) -> ClipreelResult<Self> {
        Ok(Self {
            image: load_premul_image(&layer.path)?,
            canvas,
            layer: layer.clone(),
        })
    }
}

impl LayerSource for ImageOverlaySource {
    fn draw(&mut self, canvas: &mut [u8], progress: f64, _time: f64) -> ClipreelResult<()> {
        let (cw, ch) = (self.canvas.width, self.canvas.height);
        let (w, h) = (f64::from(cw), f64::from(ch));
        let amount = self.layer.zoom_amount.unwrap_or(DEFAULT_ZOOM_AMOUNT);
        let scale = zoom_scale(self.layer.zoom_direction, amount, progress);
        let pan = pan_offset(self.layer.zoom_direction, amount, progress);

        let iw = f64::from(self.image.width);
        let ih = f64::from(self.image.height);
        let (dw, dh) = match (self.layer.width, self.layer.height) {
            (Some(rw), _) => {
                let dw = rw * w * scale;
                (dw, ih * dw / iw)
            }
            (None, Some(rh)) => {
                let dh = rh * h * scale;
                (iw * dh / ih, dh)
            }
            (None, None) => {
                let dw = w * scale;
                (dw, ih * dw / iw)
            }
        };

        let placement = Placement::resolve(self.layer.position.as_ref(), w, h);
        let (x, y) = placement.top_left(dw, dh);
        draw_image(
            canvas,
            cw,
            ch,
            &self.image,
            DrawRect {
                x: x + pan,
                y,
                w: dw,
                h: dh,
            },
            1.0,
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/image.rs"]
mod tests;
