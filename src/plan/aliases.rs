use crate::foundation::error::{ClipreelError, ClipreelResult};
use crate::scene::layer::{FillColorLayer, GlLayer, GradientLayer, Layer, LayerKind, TextLayer};

/// Title text of the `editly-banner` alias.
pub const BANNER_TEXT: &str = "Made with\nEDITLY\nmifi.no";

/// Built-in program the `rainbow-colors` alias runs.
pub const RAINBOW_PROGRAM: &str = "rainbow-colors";

/// Replace alias kinds with the concrete layers they stand for.
///
/// Expanded layers inherit the alias window. Non-alias layers pass through unchanged.
pub fn expand_aliases(layer: Layer, rng: &mut fastrand::Rng) -> ClipreelResult<Vec<Layer>> {
    let Layer { start, stop, kind } = layer;
    let windowed = |kind: LayerKind| Layer { start, stop, kind };

    match kind {
        LayerKind::Pause(fill) => Ok(vec![windowed(LayerKind::FillColor(fill))]),
        LayerKind::RainbowColors => Ok(vec![windowed(LayerKind::Gl(GlLayer {
            shader: Some(RAINBOW_PROGRAM.to_owned()),
            ..GlLayer::default()
        }))]),
        LayerKind::EditlyBanner(banner) => Ok(vec![
            windowed(LayerKind::LinearGradient(GradientLayer::default())),
            windowed(LayerKind::Title(TextLayer {
                text: BANNER_TEXT.to_owned(),
                font_path: banner.font_path,
                font_family: banner.font_family,
                ..TextLayer::default()
            })),
        ]),
        LayerKind::TitleBackground(tb) => {
            let background = match tb.background {
                Some(bg) => {
                    let mut bg = *bg;
                    if bg.start.is_none() && bg.stop.is_none() {
                        bg.start = start;
                        bg.stop = stop;
                    }
                    if matches!(
                        bg.kind,
                        LayerKind::TitleBackground(_) | LayerKind::EditlyBanner(_)
                    ) || bg.kind.is_audio_only()
                    {
                        return Err(ClipreelError::validation(format!(
                            "title-background cannot use a {} layer as background",
                            bg.kind.type_name()
                        )));
                    }
                    expand_aliases(bg, rng)?
                }
                None => vec![windowed(random_background(rng))],
            };
            let mut out = background;
            out.push(windowed(LayerKind::Title(TextLayer {
                text: tb.text,
                text_color: tb.text_color,
                font_path: tb.font_path,
                font_family: tb.font_family,
                position: tb.position,
                ..TextLayer::default()
            })));
            Ok(out)
        }
        other => Ok(vec![windowed(other)]),
    }
}

fn random_background(rng: &mut fastrand::Rng) -> LayerKind {
    match rng.usize(..3) {
        0 => LayerKind::RadialGradient(GradientLayer::default()),
        1 => LayerKind::LinearGradient(GradientLayer::default()),
        _ => LayerKind::FillColor(FillColorLayer::default()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plan/aliases.rs"]
mod tests;
