use std::sync::Arc;

use crate::foundation::core::{Canvas, FrameGeometry};
use crate::foundation::error::{ClipreelError, ClipreelResult};
use crate::plan::fonts::FontRegistry;
use crate::plan::planner::{ProcessedClip, ProcessedLayer};
use crate::plan::timing::LayerWindow;
use crate::scene::layer::LayerKind;
use crate::source::frame::{FrameSource, FrameSourceFactory, LayerSource};
use crate::source::gl::GlLayerSource;
use crate::source::image::{ImageLayerSource, ImageOverlaySource};
use crate::source::svg::{SvgLayer, SvgLayerSource};
use crate::source::video::{VideoLayerSource, decode_plan};

const FALLBACK_COLOR: &str = "#000000";
const FALLBACK_GRADIENT: [&str; 2] = ["#000428", "#004e92"];

/// Progress of `time` through `window`, when the layer is visible at `time`.
pub fn window_progress(window: &LayerWindow, time: f64) -> Option<f64> {
    if window.duration <= 0.0 {
        return None;
    }
    let p = (time - window.start) / window.duration;
    (0.0..=1.0).contains(&p).then_some(p)
}

/// Composites the visual layers of one clip, bottom first.
pub struct ClipFrameSource {
    geometry: FrameGeometry,
    layers: Vec<(LayerWindow, Box<dyn LayerSource>)>,
    closed: bool,
}

impl ClipFrameSource {
    /// Compositor over already opened layer sources.
    pub fn new(geometry: FrameGeometry, layers: Vec<(LayerWindow, Box<dyn LayerSource>)>) -> Self {
        Self {
            geometry,
            layers,
            closed: false,
        }
    }
}

impl FrameSource for ClipFrameSource {
    fn read_next_frame(&mut self, time: f64) -> ClipreelResult<Option<Vec<u8>>> {
        if self.closed {
            return Ok(None);
        }
        let mut canvas = vec![0u8; self.geometry.frame_len()];
        for (window, layer) in &mut self.layers {
            if let Some(progress) = window_progress(window, time) {
                layer.draw(&mut canvas, progress, time - window.start)?;
            }
        }
        Ok(Some(canvas))
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for (_, layer) in &mut self.layers {
            layer.close();
        }
    }
}

/// Opens [`ClipFrameSource`]s with the built-in layer sources.
#[derive(Clone)]
pub struct ClipSourceFactory {
    geometry: FrameGeometry,
    framerate_str: String,
    fonts: Arc<FontRegistry>,
    ffmpeg_path: String,
    enable_ffmpeg_log: bool,
}

impl ClipSourceFactory {
    /// Factory for frames of `geometry` at `framerate_str` (`num/den`).
    pub fn new(
        geometry: FrameGeometry,
        framerate_str: impl Into<String>,
        fonts: Arc<FontRegistry>,
        ffmpeg_path: impl Into<String>,
        enable_ffmpeg_log: bool,
    ) -> Self {
        Self {
            geometry,
            framerate_str: framerate_str.into(),
            fonts,
            ffmpeg_path: ffmpeg_path.into(),
            enable_ffmpeg_log,
        }
    }

    fn canvas(&self) -> Canvas {
        self.geometry.canvas()
    }

    fn open_layer(&self, layer: &ProcessedLayer) -> ClipreelResult<Option<Box<dyn LayerSource>>> {
        let canvas = self.canvas();
        let svg = |l: SvgLayer| -> Box<dyn LayerSource> {
            Box::new(SvgLayerSource::new(l, canvas, self.fonts.clone()))
        };
        let gradient = |colors: &Option<[String; 2]>| {
            colors
                .clone()
                .unwrap_or_else(|| FALLBACK_GRADIENT.map(str::to_owned))
        };
        let source: Box<dyn LayerSource> = match &layer.kind {
            LayerKind::Audio(_) | LayerKind::DetachedAudio(_) => return Ok(None),
            LayerKind::Video(v) => {
                let info = layer.media.as_ref().ok_or_else(|| {
                    ClipreelError::evaluation(format!("video '{}' was not probed", v.path))
                })?;
                let cut = layer.cut.unwrap_or((0.0, info.duration));
                let plan = decode_plan(
                    v,
                    info,
                    cut,
                    layer.speed_factor,
                    canvas,
                    &self.framerate_str,
                )?;
                Box::new(VideoLayerSource::spawn(
                    &self.ffmpeg_path,
                    &v.path,
                    plan,
                    canvas,
                    self.enable_ffmpeg_log,
                )?)
            }
            LayerKind::Image(i) => Box::new(ImageLayerSource::new(i, canvas)?),
            LayerKind::ImageOverlay(i) => Box::new(ImageOverlaySource::new(i, canvas)?),
            LayerKind::Title(t) => svg(SvgLayer::Title(t.clone())),
            LayerKind::Subtitle(t) => svg(SvgLayer::Subtitle(t.clone())),
            LayerKind::NewsTitle(t) => svg(SvgLayer::NewsTitle(t.clone())),
            LayerKind::SlideInText(t) => svg(SvgLayer::SlideInText(t.clone())),
            LayerKind::FillColor(c) => svg(SvgLayer::Fill {
                color: c.color.clone().unwrap_or_else(|| FALLBACK_COLOR.to_owned()),
            }),
            LayerKind::LinearGradient(g) => svg(SvgLayer::Linear {
                colors: gradient(&g.colors),
            }),
            LayerKind::RadialGradient(g) => svg(SvgLayer::Radial {
                colors: gradient(&g.colors),
            }),
            LayerKind::Gl(g) => Box::new(GlLayerSource::new(g, canvas)?),
            LayerKind::Pause(_)
            | LayerKind::RainbowColors
            | LayerKind::TitleBackground(_)
            | LayerKind::EditlyBanner(_) => {
                return Err(ClipreelError::evaluation(format!(
                    "layer alias '{}' reached the renderer unexpanded",
                    layer.kind.type_name()
                )));
            }
        };
        Ok(Some(source))
    }
}

impl FrameSourceFactory for ClipSourceFactory {
    #[tracing::instrument(skip_all, fields(clip = clip_index))]
    fn create(
        &self,
        clip_index: usize,
        clip: &ProcessedClip,
    ) -> ClipreelResult<Box<dyn FrameSource>> {
        let mut opened: Vec<(LayerWindow, Box<dyn LayerSource>)> = Vec::new();
        for (li, layer) in clip.layers.iter().enumerate() {
            tracing::debug!(layer = li, kind = layer.kind.type_name(), "open layer source");
            match self.open_layer(layer) {
                Ok(Some(src)) => opened.push((layer.window, src)),
                Ok(None) => {}
                Err(e) => {
                    for (_, src) in &mut opened {
                        src.close();
                    }
                    return Err(e);
                }
            }
        }
        Ok(Box::new(ClipFrameSource::new(self.geometry, opened)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/clip.rs"]
mod tests;
