//! Multipart form parsing and upload validation

use axum::extract::multipart::{Field, Multipart, MultipartError};
use axum::http::StatusCode;
use image::ImageReader;
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

use super::region::{normalize_region, RawPlacement};
use super::request::{EditParameters, EditRequest, ImageAsset, ALLOWED_IMAGE_TYPES, JPEG, PNG};
use crate::config::LimitsConfig;

const MIB: u64 = 1024 * 1024;

/// Reasons an edit request is rejected before any upstream call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0}")]
    MissingField(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("{0}")]
    UnreadableImage(String),

    #[error("Malformed form data: {0}")]
    MalformedForm(String),
}

impl ValidationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ValidationError::MissingField(_) => StatusCode::BAD_REQUEST,
            ValidationError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ValidationError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ValidationError::UnreadableImage(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ValidationError::MalformedForm(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// One uploaded file part
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Every field the edit endpoint understands, before validation
#[derive(Debug, Clone, Default)]
pub struct RawEditForm {
    pub prompt: Option<String>,
    pub negative_prompt: Option<String>,
    pub image: Option<UploadedFile>,
    pub mask: Option<UploadedFile>,
    pub insert_image: Option<UploadedFile>,
    pub guidance_scale: Option<String>,
    pub strength: Option<String>,
    pub inference_steps: Option<String>,
    pub seed: Option<String>,
    pub insert_x: Option<String>,
    pub insert_y: Option<String>,
    pub insert_width: Option<String>,
    pub insert_height: Option<String>,
}

/// Which upload a check applies to; drives ceilings and messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadKind {
    Base,
    Mask,
    Insert,
}

impl UploadKind {
    fn label(self) -> &'static str {
        match self {
            UploadKind::Base => "Base image",
            UploadKind::Mask => "Mask",
            UploadKind::Insert => "Insert image",
        }
    }

    fn byte_ceiling(self, limits: &LimitsConfig) -> u64 {
        match self {
            UploadKind::Base => limits.max_image_bytes,
            UploadKind::Mask => limits.max_mask_bytes,
            UploadKind::Insert => limits.max_insert_bytes,
        }
    }

    fn too_large(self, limits: &LimitsConfig) -> ValidationError {
        ValidationError::PayloadTooLarge(format!(
            "{} exceeds the {}MB upload limit.",
            self.label(),
            self.byte_ceiling(limits) / MIB
        ))
    }
}

impl RawEditForm {
    /// Read the multipart body, stopping as soon as a file crosses its byte ceiling
    pub async fn from_multipart(
        multipart: &mut Multipart,
        limits: &LimitsConfig,
    ) -> Result<Self, ValidationError> {
        let mut form = RawEditForm::default();

        while let Some(field) = multipart.next_field().await.map_err(form_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => form.image = read_file(field, UploadKind::Base, limits).await?,
                "mask" => form.mask = read_file(field, UploadKind::Mask, limits).await?,
                "insertImage" => {
                    form.insert_image = read_file(field, UploadKind::Insert, limits).await?
                }
                "prompt" => form.prompt = Some(read_text(field).await?),
                "negativePrompt" => form.negative_prompt = Some(read_text(field).await?),
                "guidanceScale" => form.guidance_scale = Some(read_text(field).await?),
                "strength" => form.strength = Some(read_text(field).await?),
                "inferenceSteps" => form.inference_steps = Some(read_text(field).await?),
                "seed" => form.seed = Some(read_text(field).await?),
                "insertX" => form.insert_x = Some(read_text(field).await?),
                "insertY" => form.insert_y = Some(read_text(field).await?),
                "insertWidth" => form.insert_width = Some(read_text(field).await?),
                "insertHeight" => form.insert_height = Some(read_text(field).await?),
                other => debug!(field = %other, "Ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    /// Validate every field in one pass and build the edit request
    pub fn validate(self, limits: &LimitsConfig) -> Result<EditRequest, ValidationError> {
        let prompt = self
            .prompt
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ValidationError::MissingField("Prompt is required.".to_string()))?;

        let image = self
            .image
            .ok_or_else(|| ValidationError::MissingField("Base image is required.".to_string()))?;
        let base_image = validate_upload(image, UploadKind::Base, limits)?;

        let mask = self
            .mask
            .map(|m| validate_upload(m, UploadKind::Mask, limits))
            .transpose()?;

        let insert_image = self
            .insert_image
            .map(|i| validate_upload(i, UploadKind::Insert, limits))
            .transpose()?;

        let parameters = EditParameters::clamped(
            parse_number(self.guidance_scale.as_deref()),
            parse_number(self.strength.as_deref()),
            parse_number(self.inference_steps.as_deref()),
            parse_seed(self.seed.as_deref()),
        );

        let insert_region = insert_image.as_ref().and_then(|_| {
            let region = normalize_region(&RawPlacement {
                x: parse_number(self.insert_x.as_deref()),
                y: parse_number(self.insert_y.as_deref()),
                width: parse_number(self.insert_width.as_deref()),
                height: parse_number(self.insert_height.as_deref()),
            });
            if region.is_none() {
                debug!("Insert placement missing or invalid, insert disabled");
            }
            region
        });

        let negative_prompt = self
            .negative_prompt
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Ok(EditRequest {
            prompt,
            negative_prompt,
            base_image,
            mask,
            insert_image,
            insert_region,
            parameters,
        })
    }
}

async fn read_file(
    mut field: Field<'_>,
    kind: UploadKind,
    limits: &LimitsConfig,
) -> Result<Option<UploadedFile>, ValidationError> {
    let content_type = field.content_type().map(str::to_string);
    let ceiling = kind.byte_ceiling(limits);
    let mut bytes = Vec::new();

    while let Some(chunk) = field.chunk().await.map_err(form_error)? {
        if (bytes.len() + chunk.len()) as u64 > ceiling {
            return Err(kind.too_large(limits));
        }
        bytes.extend_from_slice(&chunk);
    }

    // Browsers send an empty part for an unused file input
    if bytes.is_empty() {
        return Ok(None);
    }

    Ok(Some(UploadedFile {
        bytes,
        content_type,
    }))
}

async fn read_text(field: Field<'_>) -> Result<String, ValidationError> {
    field.text().await.map_err(form_error)
}

fn form_error(e: MultipartError) -> ValidationError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ValidationError::PayloadTooLarge("Request body is too large.".to_string())
    } else {
        ValidationError::MalformedForm(e.body_text())
    }
}

fn validate_upload(
    file: UploadedFile,
    kind: UploadKind,
    limits: &LimitsConfig,
) -> Result<ImageAsset, ValidationError> {
    if file.bytes.len() as u64 > kind.byte_ceiling(limits) {
        return Err(kind.too_large(limits));
    }

    let declared = file.content_type.as_deref().map(normalize_content_type);
    let content_type = match kind {
        UploadKind::Base => match declared {
            Some(t) if ALLOWED_IMAGE_TYPES.contains(&t.as_str()) => t,
            other => {
                debug!(declared = ?other, "Coercing base image content type to PNG");
                PNG.to_string()
            }
        },
        UploadKind::Mask => match declared {
            Some(t) if t == PNG => t,
            _ => {
                return Err(ValidationError::UnsupportedMediaType(
                    "Mask must be a PNG image.".to_string(),
                ))
            }
        },
        UploadKind::Insert => match declared {
            Some(t) if ALLOWED_IMAGE_TYPES.contains(&t.as_str()) => t,
            _ => {
                return Err(ValidationError::UnsupportedMediaType(
                    "Insert image must be a PNG, JPEG, WEBP, or AVIF image.".to_string(),
                ))
            }
        },
    };

    let (width, height) = probe_dimensions(&file.bytes, kind, limits)?;

    Ok(ImageAsset {
        bytes: file.bytes,
        content_type,
        width,
        height,
    })
}

/// Read only the image header so oversized canvases are refused before decoding
fn probe_dimensions(
    bytes: &[u8],
    kind: UploadKind,
    limits: &LimitsConfig,
) -> Result<(u32, u32), ValidationError> {
    let unreadable = |e: image::ImageError| {
        ValidationError::UnreadableImage(format!("{} could not be read: {}", kind.label(), e))
    };

    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| unreadable(image::ImageError::IoError(e)))?
        .into_dimensions()
        .map_err(unreadable)?;

    if width == 0 || height == 0 {
        return Err(ValidationError::UnreadableImage(format!(
            "{} has no pixels.",
            kind.label()
        )));
    }

    if width > limits.max_side_px || height > limits.max_side_px {
        return Err(ValidationError::PayloadTooLarge(format!(
            "{} dimensions {}x{} exceed the {}px limit.",
            kind.label(),
            width,
            height,
            limits.max_side_px
        )));
    }

    if u64::from(width) * u64::from(height) > limits.max_total_pixels {
        return Err(ValidationError::PayloadTooLarge(format!(
            "{} exceeds the {} pixel limit.",
            kind.label(),
            limits.max_total_pixels
        )));
    }

    Ok((width, height))
}

fn normalize_content_type(raw: &str) -> String {
    let essence = raw.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    match essence.as_str() {
        "image/jpg" | "image/pjpeg" => JPEG.to_string(),
        _ => essence,
    }
}

fn parse_number(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
}

fn parse_seed(raw: Option<&str>) -> Option<i64> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    raw.parse::<i64>().ok().or_else(|| {
        parse_number(Some(raw))
            .filter(|v| v.is_finite() && v.abs() < i64::MAX as f64)
            .map(|v| v.trunc() as i64)
    })
}
