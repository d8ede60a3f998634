use crate::scene::layer::ZoomDirection;

/// Default zoom amount for images and overlays.
pub const DEFAULT_ZOOM_AMOUNT: f64 = 0.1;

/// Scale factor at `progress` for a Ken Burns move.
pub fn zoom_scale(direction: Option<ZoomDirection>, amount: f64, progress: f64) -> f64 {
    match direction {
        Some(ZoomDirection::Left | ZoomDirection::Right) => 1.3 + amount,
        Some(ZoomDirection::In) => 1.0 + amount * progress,
        Some(ZoomDirection::Out) => 1.0 + amount * (1.0 - progress),
        None => 1.0,
    }
}

/// Horizontal pan in pixels at `progress`.
pub fn pan_offset(direction: Option<ZoomDirection>, amount: f64, progress: f64) -> f64 {
    let range = amount * 1000.0;
    match direction {
        Some(ZoomDirection::Right) => progress * range - range / 2.0,
        Some(ZoomDirection::Left) => -(progress * range - range / 2.0),
        _ => 0.0,
    }
}
