//! Validated edit request types

use serde::{Deserialize, Serialize};

pub const GUIDANCE_SCALE_RANGE: (f32, f32) = (1.0, 20.0);
pub const STRENGTH_RANGE: (f32, f32) = (0.1, 0.9);
pub const INFERENCE_STEPS_RANGE: (u32, u32) = (10, 60);

pub const DEFAULT_GUIDANCE_SCALE: f32 = 7.5;
pub const DEFAULT_STRENGTH: f32 = 0.35;
pub const DEFAULT_INFERENCE_STEPS: u32 = 30;

pub const PNG: &str = "image/png";
pub const JPEG: &str = "image/jpeg";
pub const WEBP: &str = "image/webp";
pub const AVIF: &str = "image/avif";

/// Content types accepted for the base and insert images
pub const ALLOWED_IMAGE_TYPES: [&str; 4] = [PNG, JPEG, WEBP, AVIF];

/// An uploaded image whose header has been probed
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub width: u32,
    pub height: u32,
}

impl ImageAsset {
    /// File extension matching the content type
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            JPEG => "jpg",
            WEBP => "webp",
            AVIF => "avif",
            _ => "png",
        }
    }
}

/// Rectangle expressed as fractions of the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Rectangle in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl NormalizedRect {
    /// Project onto a canvas, rounding edges and clipping to its bounds
    pub fn to_pixels(&self, canvas_width: u32, canvas_height: u32) -> PixelRect {
        let project = |start: f32, extent: f32, size: u32| {
            let size_f = size as f32;
            let lo = (start * size_f).round().clamp(0.0, size_f) as u32;
            let hi = ((start + extent) * size_f).round().clamp(0.0, size_f) as u32;
            (lo, hi.saturating_sub(lo))
        };

        let (x, width) = project(self.x, self.width, canvas_width);
        let (y, height) = project(self.y, self.height, canvas_height);
        PixelRect {
            x,
            y,
            width,
            height,
        }
    }
}

/// Numeric generation parameters, always within their valid ranges
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditParameters {
    pub guidance_scale: f32,
    pub strength: f32,
    pub inference_steps: u32,
    pub seed: Option<i64>,
}

impl EditParameters {
    /// Build parameters from raw client values, clamping anything out of range.
    ///
    /// Missing or non-finite values fall back to the defaults before clamping.
    pub fn clamped(
        guidance_scale: Option<f64>,
        strength: Option<f64>,
        inference_steps: Option<f64>,
        seed: Option<i64>,
    ) -> Self {
        let guidance_scale = finite_or(guidance_scale, DEFAULT_GUIDANCE_SCALE as f64)
            .clamp(GUIDANCE_SCALE_RANGE.0 as f64, GUIDANCE_SCALE_RANGE.1 as f64)
            as f32;
        let strength = finite_or(strength, DEFAULT_STRENGTH as f64)
            .clamp(STRENGTH_RANGE.0 as f64, STRENGTH_RANGE.1 as f64) as f32;
        let inference_steps = finite_or(inference_steps, DEFAULT_INFERENCE_STEPS as f64)
            .round()
            .clamp(INFERENCE_STEPS_RANGE.0 as f64, INFERENCE_STEPS_RANGE.1 as f64)
            as u32;

        Self {
            guidance_scale,
            strength,
            inference_steps,
            seed,
        }
    }
}

impl Default for EditParameters {
    fn default() -> Self {
        Self::clamped(None, None, None, None)
    }
}

fn finite_or(value: Option<f64>, fallback: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(fallback)
}

/// A fully validated edit call
#[derive(Debug, Clone)]
pub struct EditRequest {
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub base_image: ImageAsset,
    pub mask: Option<ImageAsset>,
    pub insert_image: Option<ImageAsset>,
    /// Present only together with `insert_image`
    pub insert_region: Option<NormalizedRect>,
    pub parameters: EditParameters,
}

impl EditRequest {
    /// Insert image and region, when both survived validation
    pub fn insert(&self) -> Option<(&ImageAsset, NormalizedRect)> {
        match (&self.insert_image, self.insert_region) {
            (Some(image), Some(region)) => Some((image, region)),
            _ => None,
        }
    }
}
