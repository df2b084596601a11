//! Insert placement normalization

use super::request::NormalizedRect;

/// Raw placement coordinates as submitted by the client
#[derive(Debug, Clone, Copy, Default)]
pub struct RawPlacement {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// Turn raw placement values into a rectangle that never leaves the unit square.
///
/// Returns `None` (insert disabled, not an error) when any value is missing or
/// non-finite, or when the width or height is not positive. Oversized
/// rectangles are shrunk from the right/bottom; the origin is never shifted.
pub fn normalize_region(raw: &RawPlacement) -> Option<NormalizedRect> {
    let x = raw.x.filter(|v| v.is_finite())?;
    let y = raw.y.filter(|v| v.is_finite())?;
    let width = raw.width.filter(|v| v.is_finite())?;
    let height = raw.height.filter(|v| v.is_finite())?;

    if width <= 0.0 || height <= 0.0 {
        return None;
    }

    // Fit in f32 so `x + width <= 1` holds for the stored values, not just the inputs
    let x = x.clamp(0.0, 1.0) as f32;
    let y = y.clamp(0.0, 1.0) as f32;
    let width = (width.min(1.0) as f32).min(1.0 - x);
    let height = (height.min(1.0) as f32).min(1.0 - y);

    if width <= 0.0 || height <= 0.0 {
        return None;
    }

    Some(NormalizedRect {
        x,
        y,
        width,
        height,
    })
}
