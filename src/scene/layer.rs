use serde::{Deserialize, Serialize};

/// How source media is fitted into its target rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeMode {
    /// Fit inside, letterboxed.
    Contain,
    /// Fit inside over a blurred fill of the same media.
    #[default]
    ContainBlur,
    /// Fill and crop.
    Cover,
    /// Ignore aspect ratio.
    Stretch,
}

/// Ken Burns zoom direction for still images and titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZoomDirection {
    /// Zoom in over the layer duration.
    In,
    /// Zoom out over the layer duration.
    Out,
    /// Pan towards the left.
    Left,
    /// Pan towards the right.
    Right,
}

/// Named anchor positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamedPosition {
    /// Top center.
    Top,
    /// Bottom center.
    Bottom,
    /// Canvas center.
    Center,
    /// Top-left corner.
    TopLeft,
    /// Top-right corner.
    TopRight,
    /// Center of the left edge.
    CenterLeft,
    /// Center of the right edge.
    CenterRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Bottom-right corner.
    BottomRight,
}

/// Horizontal origin used by relative positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OriginX {
    /// Anchor at the left edge of the element.
    #[default]
    Left,
    /// Anchor at the horizontal center.
    Center,
    /// Anchor at the right edge.
    Right,
}

/// Vertical origin used by relative positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OriginY {
    /// Anchor at the top edge of the element.
    #[default]
    Top,
    /// Anchor at the vertical center.
    Center,
    /// Anchor at the bottom edge.
    Bottom,
}

/// Element placement: a named anchor or a relative point in `[0, 1]` canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Position {
    /// Named anchor with a 5% margin.
    Named(NamedPosition),
    /// Relative point.
    Point {
        /// Relative x.
        x: Option<f64>,
        /// Relative y.
        y: Option<f64>,
        /// Horizontal origin.
        #[serde(default, rename = "originX")]
        origin_x: Option<OriginX>,
        /// Vertical origin.
        #[serde(default, rename = "originY")]
        origin_y: Option<OriginY>,
    },
}

/// Resolved pixel anchor for a positioned element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Anchor x in pixels.
    pub left: f64,
    /// Anchor y in pixels.
    pub top: f64,
    /// Horizontal origin of the element relative to the anchor.
    pub origin_x: OriginX,
    /// Vertical origin of the element relative to the anchor.
    pub origin_y: OriginY,
}

impl Placement {
    /// Resolve `position` on a `width x height` canvas. `None` centers the element.
    pub fn resolve(position: Option<&Position>, width: f64, height: f64) -> Self {
        const MARGIN: f64 = 0.05;
        let mut p = Self {
            left: width / 2.0,
            top: height / 2.0,
            origin_x: OriginX::Center,
            origin_y: OriginY::Center,
        };
        match position {
            None => {}
            Some(Position::Named(named)) => {
                let (ox, oy, left, top) = match named {
                    NamedPosition::Top => (OriginX::Center, OriginY::Top, 0.5, MARGIN),
                    NamedPosition::Bottom => (OriginX::Center, OriginY::Bottom, 0.5, 1.0 - MARGIN),
                    NamedPosition::Center => (OriginX::Center, OriginY::Center, 0.5, 0.5),
                    NamedPosition::TopLeft => (OriginX::Left, OriginY::Top, MARGIN, MARGIN),
                    NamedPosition::TopRight => (OriginX::Right, OriginY::Top, 1.0 - MARGIN, MARGIN),
                    NamedPosition::CenterLeft => (OriginX::Left, OriginY::Center, MARGIN, 0.5),
                    NamedPosition::CenterRight => {
                        (OriginX::Right, OriginY::Center, 1.0 - MARGIN, 0.5)
                    }
                    NamedPosition::BottomLeft => {
                        (OriginX::Left, OriginY::Bottom, MARGIN, 1.0 - MARGIN)
                    }
                    NamedPosition::BottomRight => {
                        (OriginX::Right, OriginY::Bottom, 1.0 - MARGIN, 1.0 - MARGIN)
                    }
                };
                p = Self {
                    left: width * left,
                    top: height * top,
                    origin_x: ox,
                    origin_y: oy,
                };
            }
            Some(Position::Point {
                x,
                y,
                origin_x,
                origin_y,
            }) => {
                if let Some(x) = x {
                    p.origin_x = origin_x.unwrap_or_default();
                    p.left = width * x;
                }
                if let Some(y) = y {
                    p.origin_y = origin_y.unwrap_or_default();
                    p.top = height * y;
                }
            }
        }
        p
    }

    /// Top-left corner of an element of size `w x h` placed with this anchor.
    pub fn top_left(&self, w: f64, h: f64) -> (f64, f64) {
        let x = match self.origin_x {
            OriginX::Left => self.left,
            OriginX::Center => self.left - w / 2.0,
            OriginX::Right => self.left - w,
        };
        let y = match self.origin_y {
            OriginY::Top => self.top,
            OriginY::Center => self.top - h / 2.0,
            OriginY::Bottom => self.top - h,
        };
        (x, y)
    }
}

/// One layer of a clip: a time window plus the typed content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Window start, seconds relative to the clip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    /// Window stop, seconds relative to the clip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<f64>,
    /// Typed content.
    #[serde(flatten)]
    pub kind: LayerKind,
}

impl Layer {
    /// Layer spanning the whole clip.
    pub fn new(kind: LayerKind) -> Self {
        Self {
            start: None,
            stop: None,
            kind,
        }
    }

    /// Restrict the layer to `[start, stop)` within its clip.
    pub fn with_window(mut self, start: Option<f64>, stop: Option<f64>) -> Self {
        self.start = start;
        self.stop = stop;
        self
    }
}

/// Closed set of layer kinds, tagged by `type` in config documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LayerKind {
    /// Video file, decoded by ffmpeg.
    Video(VideoLayer),
    /// Audio file mixed into the clip's own audio.
    Audio(AudioLayer),
    /// Audio positioned on the global timeline relative to its clip's start.
    DetachedAudio(DetachedAudioLayer),
    /// Still image filling the canvas.
    Image(ImageLayer),
    /// Still image placed over the canvas.
    ImageOverlay(ImageOverlayLayer),
    /// Large title text.
    Title(TextLayer),
    /// Subtitle text at the bottom of the frame.
    Subtitle(TextLayer),
    /// Breaking-news style title sliding in over a colored bar.
    NewsTitle(NewsTitleLayer),
    /// Text revealed left to right, then faded out.
    SlideInText(SlideInTextLayer),
    /// Solid color fill.
    FillColor(FillColorLayer),
    /// Two-stop linear gradient.
    LinearGradient(GradientLayer),
    /// Two-stop radial gradient.
    RadialGradient(GradientLayer),
    /// Fragment shader layer.
    Gl(GlLayer),
    /// Alias for `fill-color`.
    Pause(FillColorLayer),
    /// Alias for the built-in rainbow shader.
    RainbowColors,
    /// Alias for a background layer plus a title.
    TitleBackground(TitleBackgroundLayer),
    /// Alias for a gradient plus a banner title.
    EditlyBanner(BannerLayer),
}

impl LayerKind {
    /// The `type` tag of this kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Video(_) => "video",
            Self::Audio(_) => "audio",
            Self::DetachedAudio(_) => "detached-audio",
            Self::Image(_) => "image",
            Self::ImageOverlay(_) => "image-overlay",
            Self::Title(_) => "title",
            Self::Subtitle(_) => "subtitle",
            Self::NewsTitle(_) => "news-title",
            Self::SlideInText(_) => "slide-in-text",
            Self::FillColor(_) => "fill-color",
            Self::LinearGradient(_) => "linear-gradient",
            Self::RadialGradient(_) => "radial-gradient",
            Self::Gl(_) => "gl",
            Self::Pause(_) => "pause",
            Self::RainbowColors => "rainbow-colors",
            Self::TitleBackground(_) => "title-background",
            Self::EditlyBanner(_) => "editly-banner",
        }
    }

    /// Return `true` for kinds that only contribute audio.
    pub fn is_audio_only(&self) -> bool {
        matches!(self, Self::Audio(_) | Self::DetachedAudio(_))
    }
}

/// `video` layer fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoLayer {
    /// Source path or URL.
    pub path: String,
    /// Source in-point, seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut_from: Option<f64>,
    /// Source out-point, seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut_to: Option<f64>,
    /// Fit mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize_mode: Option<ResizeMode>,
    /// Relative width in canvas units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Relative height in canvas units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Relative left offset in canvas units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    /// Relative top offset in canvas units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    /// Weight in the clip's audio mix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix_volume: Option<f64>,
}

/// `audio` layer fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioLayer {
    /// Source path or URL.
    pub path: String,
    /// Source in-point, seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut_from: Option<f64>,
    /// Source out-point, seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut_to: Option<f64>,
    /// Weight in the clip's audio mix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix_volume: Option<f64>,
}

/// `detached-audio` layer fields. The layer's `start` is relative to its clip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachedAudioLayer {
    /// Source path or URL.
    pub path: String,
    /// Source in-point, seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut_from: Option<f64>,
    /// Source out-point, seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut_to: Option<f64>,
    /// Weight in the final mix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix_volume: Option<f64>,
}

/// `image` layer fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLayer {
    /// Image path.
    pub path: String,
    /// Fit mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize_mode: Option<ResizeMode>,
    /// Ken Burns direction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_direction: Option<ZoomDirection>,
    /// Ken Burns amount (default 0.1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_amount: Option<f64>,
}

/// `image-overlay` layer fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOverlayLayer {
    /// Image path.
    pub path: String,
    /// Placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Relative width in canvas units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Relative height in canvas units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Ken Burns direction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_direction: Option<ZoomDirection>,
    /// Ken Burns amount (default 0.1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_amount: Option<f64>,
}

/// `title` / `subtitle` layer fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayer {
    /// Text, `\n` separates lines.
    pub text: String,
    /// CSS color of the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    /// Font file to register for this text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<String>,
    /// Font family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Box color behind the text (subtitles).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Ken Burns direction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_direction: Option<ZoomDirection>,
    /// Ken Burns amount (default 0.1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_amount: Option<f64>,
}

/// `news-title` layer fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsTitleLayer {
    /// Single line of text.
    pub text: String,
    /// CSS color of the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    /// CSS color of the bar behind the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Font file to register for this text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<String>,
    /// Font family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Vertical placement of the bar; near the top when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Animation start as a fraction of the layer duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
    /// Animation speed multiplier (default 1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

/// `slide-in-text` layer fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideInTextLayer {
    /// Text, `\n` separates lines.
    pub text: String,
    /// CSS color of the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    /// Deprecated spelling of `textColor`; wins when both are set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Font file to register for this text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<String>,
    /// Font family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Font size as a fraction of the canvas width (default 0.05).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    /// Letter spacing: `width * charSpacing` thousandths of an em (default 0.1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_spacing: Option<f64>,
    /// Placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// `fill-color` / `pause` layer fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillColorLayer {
    /// CSS color; a random palette color when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// `linear-gradient` / `radial-gradient` layer fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradientLayer {
    /// Two CSS colors; a random palette pair when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<[String; 2]>,
}

/// `gl` layer fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlLayer {
    /// Fragment shader file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment_path: Option<String>,
    /// Vertex shader file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_path: Option<String>,
    /// Name of a built-in shader program.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shader: Option<String>,
    /// Time multiplier (default 1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

/// `title-background` alias fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleBackgroundLayer {
    /// Title text.
    pub text: String,
    /// CSS color of the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    /// Font file to register for this text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<String>,
    /// Font family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Title placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Background layer (`fill-color`, `linear-gradient` or `radial-gradient`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Box<Layer>>,
}

/// `editly-banner` alias fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerLayer {
    /// Font file for the banner title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<String>,
    /// Font family for the banner title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

/// Overridable layer fields shared by defaults.
///
/// Merge precedence is global layer defaults, then per-type defaults, then the explicit
/// layer; a field set at a later level wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDefaults {
    /// Font file for text layers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<String>,
    /// Font family for text layers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Text color for text layers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    /// Box color for subtitles and news titles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Fill color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Gradient colors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<[String; 2]>,
    /// Fit mode for video and images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize_mode: Option<ResizeMode>,
    /// Mix weight for video and audio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix_volume: Option<f64>,
    /// Ken Burns direction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_direction: Option<ZoomDirection>,
    /// Ken Burns amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_amount: Option<f64>,
    /// Placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

fn fill<T: Clone>(slot: &mut Option<T>, fallback: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(fallback);
    }
}

impl LayerDefaults {
    /// Field-wise merge where fields set in `over` win.
    pub fn overlaid_with(&self, over: &LayerDefaults) -> LayerDefaults {
        let mut out = over.clone();
        fill(&mut out.font_path, &self.font_path);
        fill(&mut out.font_family, &self.font_family);
        fill(&mut out.text_color, &self.text_color);
        fill(&mut out.background_color, &self.background_color);
        fill(&mut out.color, &self.color);
        fill(&mut out.colors, &self.colors);
        fill(&mut out.resize_mode, &self.resize_mode);
        fill(&mut out.mix_volume, &self.mix_volume);
        fill(&mut out.zoom_direction, &self.zoom_direction);
        fill(&mut out.zoom_amount, &self.zoom_amount);
        fill(&mut out.position, &self.position);
        out
    }

    /// Fill every field the layer leaves unset and that applies to its kind.
    pub fn apply_to(&self, kind: &mut LayerKind) {
        match kind {
            LayerKind::Video(v) => {
                fill(&mut v.resize_mode, &self.resize_mode);
                fill(&mut v.mix_volume, &self.mix_volume);
            }
            LayerKind::Audio(a) => fill(&mut a.mix_volume, &self.mix_volume),
            LayerKind::DetachedAudio(a) => fill(&mut a.mix_volume, &self.mix_volume),
            LayerKind::Image(i) => {
                fill(&mut i.resize_mode, &self.resize_mode);
                fill(&mut i.zoom_direction, &self.zoom_direction);
                fill(&mut i.zoom_amount, &self.zoom_amount);
            }
            LayerKind::ImageOverlay(i) => {
                fill(&mut i.position, &self.position);
                fill(&mut i.zoom_direction, &self.zoom_direction);
                fill(&mut i.zoom_amount, &self.zoom_amount);
            }
            LayerKind::Title(t) | LayerKind::Subtitle(t) => {
                fill(&mut t.font_path, &self.font_path);
                fill(&mut t.font_family, &self.font_family);
                fill(&mut t.text_color, &self.text_color);
                fill(&mut t.background_color, &self.background_color);
                fill(&mut t.position, &self.position);
                fill(&mut t.zoom_direction, &self.zoom_direction);
                fill(&mut t.zoom_amount, &self.zoom_amount);
            }
            LayerKind::NewsTitle(t) => {
                fill(&mut t.font_path, &self.font_path);
                fill(&mut t.font_family, &self.font_family);
                fill(&mut t.text_color, &self.text_color);
                fill(&mut t.background_color, &self.background_color);
                fill(&mut t.position, &self.position);
            }
            LayerKind::SlideInText(t) => {
                fill(&mut t.font_path, &self.font_path);
                fill(&mut t.font_family, &self.font_family);
                fill(&mut t.text_color, &self.text_color);
                fill(&mut t.position, &self.position);
            }
            LayerKind::FillColor(f) | LayerKind::Pause(f) => fill(&mut f.color, &self.color),
            LayerKind::LinearGradient(g) | LayerKind::RadialGradient(g) => {
                fill(&mut g.colors, &self.colors)
            }
            LayerKind::TitleBackground(t) => {
                fill(&mut t.font_path, &self.font_path);
                fill(&mut t.font_family, &self.font_family);
                fill(&mut t.text_color, &self.text_color);
                fill(&mut t.position, &self.position);
            }
            LayerKind::EditlyBanner(b) => {
                fill(&mut b.font_path, &self.font_path);
                fill(&mut b.font_family, &self.font_family);
            }
            LayerKind::Gl(_) | LayerKind::RainbowColors => {}
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/layer.rs"]
mod tests;
