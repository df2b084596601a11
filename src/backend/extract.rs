//! Image extraction from chat-completion style generation responses
//!
//! Providers place the generated image in several places. Each location has
//! its own extractor; they are tried in a fixed priority order per choice.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::backend::traits::GeneratedImage;
use crate::error::{AppError, Result};
use crate::response::base64;

const DEFAULT_MIME: &str = "image/png";

/// Content part types that carry inline base64 image data
const OUTPUT_IMAGE_MARKERS: [&str; 2] = ["output_image", "image"];

/// A value in the expected shape, or whatever JSON was sent instead
///
/// Used for every collection element so one odd entry never hides an image
/// sitting next to it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Lenient<T> {
    Known(T),
    Other(Value),
}

impl<T> Lenient<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Lenient::Known(value) => Some(value),
            Lenient::Other(_) => None,
        }
    }
}

/// Accept any JSON for a string field, keeping it only when it is a string
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<Lenient<Choice>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub images: Option<Lenient<Vec<Lenient<ContentPart>>>>,
    #[serde(default)]
    pub content: Option<MessageContent>,
}

/// The shapes `message.content` is seen in
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Parts(Vec<Lenient<ContentPart>>),
    Single(ContentPart),
    Text(String),
    Other(Value),
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentPart {
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub kind: Option<String>,
    #[serde(default)]
    pub image_url: Option<ImageUrl>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub b64_json: Option<String>,
    #[serde(default, alias = "mimeType", deserialize_with = "lenient_string")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ImageUrl {
    Object { url: String },
    Bare(String),
    Other(Value),
}

impl ImageUrl {
    fn url(&self) -> Option<&str> {
        let url = match self {
            ImageUrl::Object { url } | ImageUrl::Bare(url) => url.as_str(),
            ImageUrl::Other(_) => return None,
        };
        Some(url).filter(|u| !u.trim().is_empty())
    }
}

impl ContentPart {
    fn image_url(&self) -> Option<String> {
        self.image_url.as_ref()?.url().map(str::to_string)
    }

    /// Image reference carried by a content part, if it is an image part
    fn image_reference(&self) -> Option<String> {
        let kind = self.kind.as_deref()?;
        if kind == "image_url" {
            return self.image_url();
        }
        if OUTPUT_IMAGE_MARKERS.contains(&kind) {
            let payload = self.b64_json.as_deref().filter(|b| !b.trim().is_empty())?;
            let mime = self.mime_type.as_deref().unwrap_or(DEFAULT_MIME);
            return Some(format!("data:{mime};base64,{payload}"));
        }
        None
    }
}

type Extractor = fn(&ChoiceMessage) -> Option<String>;

/// Extractors in priority order
const EXTRACTORS: [Extractor; 3] = [from_images, from_content_parts, from_content_object];

fn from_images(message: &ChoiceMessage) -> Option<String> {
    message
        .images
        .as_ref()?
        .known()?
        .iter()
        .filter_map(Lenient::known)
        .find_map(ContentPart::image_url)
}

fn from_content_parts(message: &ChoiceMessage) -> Option<String> {
    match message.content.as_ref()? {
        MessageContent::Parts(parts) => parts
            .iter()
            .filter_map(Lenient::known)
            .find_map(ContentPart::image_reference),
        _ => None,
    }
}

fn from_content_object(message: &ChoiceMessage) -> Option<String> {
    match message.content.as_ref()? {
        MessageContent::Single(part) => part.image_reference(),
        _ => None,
    }
}

/// Find the first image reference across all choices
pub fn find_image_reference(completion: &ChatCompletion) -> Option<String> {
    completion
        .choices
        .iter()
        .filter_map(Lenient::known)
        .filter_map(|choice| choice.message.as_ref())
        .find_map(|message| EXTRACTORS.iter().find_map(|extract| extract(message)))
}

/// Decode an image reference: a base64 data URL, or bare base64 assumed to be PNG
pub fn parse_image_payload(reference: &str) -> Result<GeneratedImage> {
    let reference = reference.trim();
    let (mime_type, payload) = if reference.starts_with("data:") {
        base64::split_data_url(reference).ok_or_else(|| {
            AppError::MalformedImagePayload("image data URL is not base64 encoded".to_string())
        })?
    } else {
        (DEFAULT_MIME, reference)
    };

    let bytes = base64::decode(payload)
        .map_err(|e| AppError::MalformedImagePayload(format!("invalid base64 data: {}", e)))?;
    if bytes.is_empty() {
        return Err(AppError::MalformedImagePayload("image payload is empty".to_string()));
    }

    Ok(GeneratedImage {
        mime_type: mime_type.to_string(),
        bytes,
    })
}

/// Locate and decode the first generated image in a response body
pub fn extract_image(completion: &ChatCompletion) -> Result<GeneratedImage> {
    let reference = find_image_reference(completion).ok_or(AppError::NoImageReturned)?;
    parse_image_payload(&reference)
}
