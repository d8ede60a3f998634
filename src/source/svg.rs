use std::fmt::Write as _;
use std::sync::Arc;

use crate::foundation::core::Canvas;
use crate::foundation::error::{ClipreelError, ClipreelResult};
use crate::foundation::math::over_premul_in_place;
use crate::plan::fonts::FontRegistry;
use crate::scene::layer::{
    NewsTitleLayer, OriginX, OriginY, Placement, SlideInTextLayer, TextLayer, ZoomDirection,
};
use crate::source::frame::LayerSource;
use crate::source::kenburns::{pan_offset, zoom_scale};
use crate::source::raster::rasterize_svg;
use crate::transition::ease::Easing;

const DEFAULT_FONT_FAMILY: &str = "sans-serif";
const DEFAULT_TEXT_COLOR: &str = "#ffffff";
const DEFAULT_SUBTITLE_BACKGROUND: &str = "rgba(0,0,0,0.3)";
const DEFAULT_NEWS_BACKGROUND: &str = "#d02a42";
const TITLE_ZOOM_AMOUNT: f64 = 0.2;
const LINE_HEIGHT: f64 = 1.2;
// Average advance of a glyph relative to the font size.
const GLYPH_ADVANCE: f64 = 0.6;

/// Layers drawn from a generated SVG document.
#[derive(Clone, Debug, PartialEq)]
pub enum SvgLayer {
    /// Solid fill.
    Fill {
        /// CSS color.
        color: String,
    },
    /// Diagonal gradient rotating slowly over the layer.
    Linear {
        /// Start and end colors.
        colors: [String; 2],
    },
    /// Radial gradient growing over the layer.
    Radial {
        /// Inner and outer colors.
        colors: [String; 2],
    },
    /// Centered title with a Ken Burns zoom.
    Title(TextLayer),
    /// Subtitle sliding in over a translucent box.
    Subtitle(TextLayer),
    /// Colored bar and text sliding in from the left.
    NewsTitle(NewsTitleLayer),
    /// Text uncovered by a moving gradient mask.
    SlideInText(SlideInTextLayer),
}

pub(crate) fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn f(v: f64) -> String {
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-0" || s == "-" {
        "0".to_owned()
    } else {
        s.to_owned()
    }
}

impl SvgLayer {
    /// Return `true` when every frame is identical.
    pub fn is_static(&self) -> bool {
        matches!(self, Self::Fill { .. })
    }

    /// SVG document of the layer at `progress` on `canvas`.
    pub fn document(&self, canvas: Canvas, progress: f64) -> String {
        let w = f64::from(canvas.width);
        let h = f64::from(canvas.height);
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            canvas.width, canvas.height, canvas.width, canvas.height
        );
        match self {
            Self::Fill { color } => {
                let _ = write!(
                    svg,
                    r#"<rect x="0" y="0" width="{}" height="{}" fill="{}"/>"#,
                    f(w),
                    f(h),
                    xml_escape(color)
                );
            }
            Self::Linear { colors } => {
                // Oversized so the rotation never uncovers a corner.
                let _ = write!(
                    svg,
                    r#"<defs><linearGradient id="g" gradientUnits="userSpaceOnUse" x1="{}" y1="{}" x2="{}" y2="{}"><stop offset="0" stop-color="{}"/><stop offset="1" stop-color="{}"/></linearGradient></defs><g transform="rotate({} {} {})"><rect x="{}" y="{}" width="{}" height="{}" fill="url(#g)"/></g>"#,
                    f(-w / 2.0),
                    f(-h / 2.0),
                    f(w / 2.0),
                    f(h / 2.0),
                    xml_escape(&colors[0]),
                    xml_escape(&colors[1]),
                    f(progress * 30.0),
                    f(w / 2.0),
                    f(h / 2.0),
                    f(-w / 2.0),
                    f(-h / 2.0),
                    f(w * 2.0),
                    f(h * 2.0),
                );
            }
            Self::Radial { colors } => {
                let r = w.max(h) * (1.0 + progress) * 0.6;
                let _ = write!(
                    svg,
                    r#"<defs><radialGradient id="g" gradientUnits="userSpaceOnUse" cx="{}" cy="{}" r="{}"><stop offset="0" stop-color="{}"/><stop offset="1" stop-color="{}"/></radialGradient></defs><rect x="0" y="0" width="{}" height="{}" fill="url(#g)"/>"#,
                    f(w / 2.0),
                    f(h / 2.0),
                    f(r),
                    xml_escape(&colors[0]),
                    xml_escape(&colors[1]),
                    f(w),
                    f(h),
                );
            }
            Self::Title(t) => title_svg(&mut svg, t, w, h, progress),
            Self::Subtitle(t) => subtitle_svg(&mut svg, t, w, h, progress),
            Self::NewsTitle(t) => news_title_svg(&mut svg, t, w, h, progress),
            Self::SlideInText(t) => slide_in_text_svg(&mut svg, t, w, h, progress),
        }
        svg.push_str("</svg>");
        svg
    }
}

fn text_lines(
    svg: &mut String,
    lines: &[&str],
    x: f64,
    first_baseline: f64,
    line_h: f64,
    anchor: &str,
) {
    for (i, line) in lines.iter().enumerate() {
        let _ = write!(
            svg,
            r#"<tspan x="{}" y="{}" text-anchor="{}">{}</tspan>"#,
            f(x),
            f(first_baseline + i as f64 * line_h),
            anchor,
            xml_escape(line)
        );
    }
}

fn title_svg(svg: &mut String, t: &TextLayer, w: f64, h: f64, progress: f64) {
    let direction = t.zoom_direction.or(Some(ZoomDirection::In));
    let amount = t.zoom_amount.unwrap_or(TITLE_ZOOM_AMOUNT);
    let scale = zoom_scale(direction, amount, progress);
    let pan = pan_offset(direction, amount, progress);

    let font_size = (w.min(h) * 0.1).round();
    let line_h = font_size * LINE_HEIGHT;
    let lines: Vec<&str> = t.text.split('\n').collect();
    let block_h = lines.len() as f64 * line_h;

    let p = Placement::resolve(t.position.as_ref(), w, h);
    let ax = p.left + pan;
    let ay = p.top;
    let anchor = match p.origin_x {
        OriginX::Left => "start",
        OriginX::Center => "middle",
        OriginX::Right => "end",
    };
    let top = match p.origin_y {
        OriginY::Top => ay,
        OriginY::Center => ay - block_h / 2.0,
        OriginY::Bottom => ay - block_h,
    };
    let first_baseline = top + (line_h - font_size) / 2.0 + font_size * 0.8;

    let _ = write!(
        svg,
        r#"<g transform="translate({} {}) scale({}) translate({} {})"><text font-family="{}" font-size="{}" fill="{}">"#,
        f(ax),
        f(ay),
        f(scale),
        f(-ax),
        f(-ay),
        xml_escape(t.font_family.as_deref().unwrap_or(DEFAULT_FONT_FAMILY)),
        f(font_size),
        xml_escape(t.text_color.as_deref().unwrap_or(DEFAULT_TEXT_COLOR)),
    );
    text_lines(svg, &lines, ax, first_baseline, line_h, anchor);
    svg.push_str("</text></g>");
}

fn subtitle_svg(svg: &mut String, t: &TextLayer, w: f64, h: f64, progress: f64) {
    let eased = Easing::EaseOutExpo.apply(progress.clamp(0.0, 1.0));
    let min = w.min(h);
    let padding = 0.05 * min;
    let font_size = min / 20.0;
    let line_h = font_size * LINE_HEIGHT;
    let lines: Vec<&str> = t.text.split('\n').collect();
    let text_h = lines.len() as f64 * line_h;
    let box_h = text_h + padding * 2.0;

    let _ = write!(
        svg,
        r#"<rect x="0" y="{}" width="{}" height="{}" fill="{}" opacity="{}"/>"#,
        f(h - box_h),
        f(w),
        f(box_h),
        xml_escape(
            t.background_color
                .as_deref()
                .unwrap_or(DEFAULT_SUBTITLE_BACKGROUND)
        ),
        f(eased),
    );
    let x = padding + (eased - 1.0) * padding;
    let first_baseline = h - padding - text_h + (line_h - font_size) / 2.0 + font_size * 0.8;
    let _ = write!(
        svg,
        r#"<text font-family="{}" font-size="{}" fill="{}" opacity="{}">"#,
        xml_escape(t.font_family.as_deref().unwrap_or(DEFAULT_FONT_FAMILY)),
        f(font_size),
        xml_escape(t.text_color.as_deref().unwrap_or(DEFAULT_TEXT_COLOR)),
        f(eased),
    );
    text_lines(svg, &lines, x, first_baseline, line_h, "start");
    svg.push_str("</text>");
}

/// Rough width of one line of text; SVG text cannot be measured before rasterizing.
fn estimate_line_width(line: &str, font_size: f64, letter_spacing: f64) -> f64 {
    let n = line.chars().count() as f64;
    n * (font_size * GLYPH_ADVANCE + letter_spacing)
}

fn news_title_svg(svg: &mut String, t: &NewsTitleLayer, w: f64, h: f64, progress: f64) {
    let delay = t.delay.unwrap_or(0.0);
    let speed = t.speed.unwrap_or(1.0);
    let phase = |offset: f64, rate: f64| {
        Easing::EaseOutExpo.apply(((progress - delay - offset) * speed * rate).clamp(0.0, 1.0))
    };
    let bg_progress = phase(0.0, 3.0);
    let text_progress = phase(0.02, 4.0);
    let text_opacity = phase(0.07, 4.0);

    let min = w.min(h);
    let font_size = (min * 0.05).round();
    let letter_spacing = font_size * w * 0.1 / 1000.0;
    let padding_v = 0.07 * min;
    let padding_h = 0.03 * min;
    let top = match &t.position {
        Some(position) => Placement::resolve(Some(position), w, h).top,
        None => h * 0.08,
    };
    let text_w = estimate_line_width(&t.text, font_size, letter_spacing);
    let text_h = font_size * LINE_HEIGHT;
    let bg_w = text_w + padding_v * 2.0;

    let _ = write!(
        svg,
        r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
        f((bg_progress - 1.0) * bg_w),
        f(top - padding_h),
        f(bg_w),
        f(text_h + padding_h * 2.0),
        xml_escape(
            t.background_color
                .as_deref()
                .unwrap_or(DEFAULT_NEWS_BACKGROUND)
        ),
    );
    let _ = write!(
        svg,
        r#"<text x="{}" y="{}" font-family="{}" font-size="{}" letter-spacing="{}" fill="{}" opacity="{}">{}</text>"#,
        f(padding_v + (text_progress - 1.0) * w),
        f(top + (text_h - font_size) / 2.0 + font_size * 0.8),
        xml_escape(t.font_family.as_deref().unwrap_or(DEFAULT_FONT_FAMILY)),
        f(font_size),
        f(letter_spacing),
        xml_escape(t.text_color.as_deref().unwrap_or(DEFAULT_TEXT_COLOR)),
        f(text_opacity),
        xml_escape(&t.text),
    );
}

/// Reveal and opacity of slide-in text: the mask opens over `[0.1, 0.3]` and the text fades
/// out over `[0.8, 0.9]`.
fn slide_in_keyframes(progress: f64) -> (f64, f64) {
    let slide = ((progress - 0.1) / 0.2).clamp(0.0, 1.0);
    let opacity = if progress <= 0.8 {
        1.0
    } else {
        (1.0 - (progress - 0.8) / 0.1).clamp(0.0, 1.0)
    };
    (slide, opacity)
}

fn slide_in_text_svg(svg: &mut String, t: &SlideInTextLayer, w: f64, h: f64, progress: f64) {
    let (slide, opacity) = slide_in_keyframes(progress);
    let reveal = Easing::EaseInOutCubic.apply(slide);
    let solid_until = (reveal * 1.2 - 0.2).max(0.0);
    let clear_from = (reveal * 1.2).min(1.0);

    let font_size = (w * t.font_size.unwrap_or(0.05)).round();
    let letter_spacing = font_size * w * t.char_spacing.unwrap_or(0.1) / 1000.0;
    let line_h = font_size * LINE_HEIGHT;
    let lines: Vec<&str> = t.text.split('\n').collect();
    let text_w = lines
        .iter()
        .map(|l| estimate_line_width(l, font_size, letter_spacing))
        .fold(0.0, f64::max);
    let text_h = lines.len() as f64 * line_h;

    let p = Placement::resolve(t.position.as_ref(), w, h);
    let (x0, y0) = p.top_left(text_w, text_h);
    let color = t
        .color
        .as_deref()
        .or(t.text_color.as_deref())
        .unwrap_or(DEFAULT_TEXT_COLOR);

    let _ = write!(
        svg,
        r##"<defs><linearGradient id="reveal" gradientUnits="userSpaceOnUse" x1="{}" y1="0" x2="{}" y2="0"><stop offset="{}" stop-color="#fff" stop-opacity="1"/><stop offset="{}" stop-color="#fff" stop-opacity="0"/></linearGradient><mask id="m" maskUnits="userSpaceOnUse" x="0" y="0" width="{}" height="{}"><rect x="{}" y="{}" width="{}" height="{}" fill="url(#reveal)"/></mask></defs>"##,
        f(x0),
        f(x0 + text_w),
        f(solid_until),
        f(clear_from),
        f(w),
        f(h),
        f(x0),
        f(y0),
        f(text_w),
        f(text_h),
    );
    let _ = write!(
        svg,
        r#"<g opacity="{}" mask="url(#m)"><text font-family="{}" font-size="{}" letter-spacing="{}" fill="{}">"#,
        f(opacity),
        xml_escape(t.font_family.as_deref().unwrap_or(DEFAULT_FONT_FAMILY)),
        f(font_size),
        f(letter_spacing),
        xml_escape(color),
    );
    let first_baseline = y0 + (line_h - font_size) / 2.0 + font_size * 0.8;
    text_lines(svg, &lines, x0, first_baseline, line_h, "start");
    svg.push_str("</text></g>");
}

/// [`LayerSource`] rasterizing an [`SvgLayer`] each frame.
pub struct SvgLayerSource {
    layer: SvgLayer,
    canvas: Canvas,
    fonts: Arc<FontRegistry>,
    cached: Option<Vec<u8>>,
}

impl SvgLayerSource {
    /// Source drawing `layer` on `canvas`, resolving text with `fonts`.
    pub fn new(layer: SvgLayer, canvas: Canvas, fonts: Arc<FontRegistry>) -> Self {
        Self {
            layer,
            canvas,
            fonts,
            cached: None,
        }
    }

    fn render(&self, progress: f64) -> ClipreelResult<Vec<u8>> {
        let doc = self.layer.document(self.canvas, progress);
        let opts = self.fonts.svg_options()?;
        rasterize_svg(&doc, self.canvas.width, self.canvas.height, &opts)
    }
}

impl LayerSource for SvgLayerSource {
    fn draw(&mut self, canvas: &mut [u8], progress: f64, _time: f64) -> ClipreelResult<()> {
        if self.layer.is_static() {
            if self.cached.is_none() {
                self.cached = Some(self.render(0.0)?);
            }
            let px = self
                .cached
                .as_deref()
                .ok_or_else(|| ClipreelError::evaluation("svg layer cache missing"))?;
            return over_premul_in_place(canvas, px);
        }
        let px = self.render(progress)?;
        over_premul_in_place(canvas, &px)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/svg.rs"]
mod tests;
