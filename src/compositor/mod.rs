//! Mask-aware compositing of generated pixels over the original photo
//!
//! Every buffer is cover-fit onto one canvas taken from the base image, so the
//! mask, the generated layer, and the original line up pixel for pixel.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageFormat, ImageReader, Limits, Luma, RgbaImage};
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

use crate::config::LimitsConfig;
use crate::edit::NormalizedRect;

/// Canvas used when neither input reports usable dimensions
pub const DEFAULT_CANVAS: (u32, u32) = (1024, 1024);

#[derive(Debug, Error)]
pub enum CompositeError {
    #[error("could not decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: image::ImageError,
    },

    #[error("could not encode PNG output: {0}")]
    Encode(#[source] image::ImageError),
}

/// Everything the compositor needs for one edit
#[derive(Debug, Clone)]
pub struct CompositeInput {
    pub base: Vec<u8>,
    pub base_dimensions: Option<(u32, u32)>,
    pub generated: Vec<u8>,
    pub mask: Option<Vec<u8>>,
    pub insert_region: Option<NormalizedRect>,
    pub strength: f32,
}

/// Encoded result plus the canvas it was rendered on
#[derive(Debug, Clone)]
pub struct CompositeOutput {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub masked: bool,
}

/// Raster compositor with decode limits for untrusted buffers
#[derive(Debug, Clone)]
pub struct Compositor {
    limits: Limits,
}

impl Compositor {
    pub fn new(limits: &LimitsConfig) -> Self {
        let mut decode_limits = Limits::default();
        decode_limits.max_image_width = Some(limits.max_side_px);
        decode_limits.max_image_height = Some(limits.max_side_px);
        // RGBA at 4 bytes per pixel, with headroom for codec scratch buffers
        decode_limits.max_alloc = Some(limits.max_total_pixels.saturating_mul(4 * 2));
        Self {
            limits: decode_limits,
        }
    }

    /// Blend the generated image over the base and encode the result as PNG
    pub fn composite(&self, input: &CompositeInput) -> Result<CompositeOutput, CompositeError> {
        let generated = self.decode(&input.generated, "generated image")?;
        let (width, height) = canvas_size(
            input.base_dimensions,
            Some((generated.width(), generated.height())),
        );
        debug!(canvas_width = width, canvas_height = height, "Compositing edit");

        let generated = cover_fit(&generated, width, height).to_rgba8();

        let alpha = match (&input.mask, input.insert_region) {
            (Some(mask), _) => {
                let mask = self.decode(mask, "mask")?;
                Some(cover_fit(&mask, width, height).to_luma8())
            }
            (None, Some(region)) => Some(placement_mask(region, width, height)),
            (None, None) => None,
        }
        .map(|mask| scale_mask(mask, input.strength));

        let Some(alpha) = alpha else {
            return Ok(CompositeOutput {
                png: encode_png(generated)?,
                width,
                height,
                masked: false,
            });
        };

        let base = self.decode(&input.base, "base image")?;
        let mut canvas = cover_fit(&base, width, height).to_rgba8();
        let layer = apply_alpha(generated, &alpha);
        imageops::overlay(&mut canvas, &layer, 0, 0);

        Ok(CompositeOutput {
            png: encode_png(canvas)?,
            width,
            height,
            masked: true,
        })
    }

    fn decode(&self, bytes: &[u8], what: &'static str) -> Result<DynamicImage, CompositeError> {
        let decode_error = |source| CompositeError::Decode { what, source };
        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| decode_error(image::ImageError::IoError(e)))?;
        reader.limits(self.limits.clone());
        reader.decode().map_err(decode_error)
    }
}

/// Canvas dimensions: base image first, then generated image, then the default
pub fn canvas_size(base: Option<(u32, u32)>, generated: Option<(u32, u32)>) -> (u32, u32) {
    let usable = |dims: Option<(u32, u32)>| dims.filter(|(w, h)| *w > 0 && *h > 0);
    usable(base)
        .or_else(|| usable(generated))
        .unwrap_or(DEFAULT_CANVAS)
}

/// Scale to fill the canvas, center-cropping whatever overflows
pub fn cover_fit(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    if image.width() == width && image.height() == height {
        return image.clone();
    }
    image.resize_to_fill(width, height, FilterType::Lanczos3)
}

/// Black canvas with a white rectangle at the projected insert region
pub fn placement_mask(region: NormalizedRect, width: u32, height: u32) -> GrayImage {
    let rect = region.to_pixels(width, height);
    let mut mask = GrayImage::new(width, height);
    for y in rect.y..rect.y + rect.height {
        for x in rect.x..rect.x + rect.width {
            mask.put_pixel(x, y, Luma([255]));
        }
    }
    mask
}

/// Attenuate mask intensity by the blend strength
pub fn scale_mask(mut mask: GrayImage, strength: f32) -> GrayImage {
    let strength = strength.clamp(0.0, 1.0);
    for pixel in mask.pixels_mut() {
        pixel.0[0] = (f32::from(pixel.0[0]) * strength).round() as u8;
    }
    mask
}

/// Replace the layer's alpha channel with the mask
fn apply_alpha(mut layer: RgbaImage, alpha: &GrayImage) -> RgbaImage {
    for (pixel, mask) in layer.pixels_mut().zip(alpha.pixels()) {
        pixel.0[3] = mask.0[0];
    }
    layer
}

fn encode_png(image: RgbaImage) -> Result<Vec<u8>, CompositeError> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut out, ImageFormat::Png)
        .map_err(CompositeError::Encode)?;
    Ok(out.into_inner())
}
