//! HTTP generation client for chat-completion style image APIs

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::backend::extract::{extract_image, ChatCompletion};
use crate::backend::traits::{GeneratedImage, GenerationBackend};
use crate::config::GenerationConfig;
use crate::edit::{AssembledPrompt, GenerationPromptSegment};
use crate::error::{AppError, Result};
use crate::response::base64;

/// Longest slice of a raw upstream error body surfaced to clients
const RAW_ERROR_PREVIEW_CHARS: usize = 160;

/// Generation backend speaking the chat-completions wire format
pub struct HttpGenerationBackend {
    name: String,
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    modalities: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    modalities: &'a [String],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<WireContent>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireContent {
    Text { text: String },
    ImageUrl { image_url: WireImageUrl },
}

#[derive(Debug, Serialize)]
struct WireImageUrl {
    url: String,
}

impl From<&GenerationPromptSegment> for WireContent {
    fn from(segment: &GenerationPromptSegment) -> Self {
        match segment {
            GenerationPromptSegment::Text(text) => WireContent::Text { text: text.clone() },
            GenerationPromptSegment::Image { mime_type, bytes } => WireContent::ImageUrl {
                image_url: WireImageUrl {
                    url: base64::create_data_url(bytes, mime_type),
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<ApiErrorField>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiErrorField {
    Detailed { message: String },
    Plain(String),
    Other(serde_json::Value),
}

impl HttpGenerationBackend {
    /// Create a new generation backend from configuration
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            name: config.model.clone(),
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key().map(str::to_string),
            model: config.model.clone(),
            modalities: config.modalities.clone(),
        })
    }

    fn build_request<'a>(&'a self, prompt: &AssembledPrompt) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.segments.iter().map(WireContent::from).collect(),
            }],
            modalities: &self.modalities,
            temperature: prompt.temperature,
        }
    }
}

#[async_trait]
impl GenerationBackend for HttpGenerationBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &AssembledPrompt) -> Result<GeneratedImage> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::UpstreamConfig("Image generation is not configured.".to_string())
        })?;

        debug!(
            backend = %self.name,
            segments = prompt.segments.len(),
            temperature = prompt.temperature,
            "Sending edit request to generation service"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&self.build_request(prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout("Generation service did not respond in time".to_string())
                } else {
                    AppError::HttpClient(e)
                }
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = upstream_error_message(status.as_u16(), &body);
            warn!(backend = %self.name, status = status.as_u16(), error = %message, "Generation service rejected request");
            return Err(AppError::UpstreamRequestFailed {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletion = serde_json::from_str(&body).map_err(|e| {
            AppError::MalformedImagePayload(format!("response body is not valid JSON: {}", e))
        })?;
        let image = extract_image(&completion)?;

        info!(
            backend = %self.name,
            mime_type = %image.mime_type,
            size = image.bytes.len(),
            "Generation service returned an image"
        );
        Ok(image)
    }
}

/// Best available error message for a non-2xx upstream response
pub fn upstream_error_message(status: u16, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        let structured = match parsed.error {
            Some(ApiErrorField::Detailed { message }) | Some(ApiErrorField::Plain(message)) => {
                Some(message)
            }
            _ => parsed.message,
        };
        if let Some(message) = structured.filter(|m| !m.trim().is_empty()) {
            return message;
        }
    }

    let raw = body.trim();
    if !raw.is_empty() {
        return raw.chars().take(RAW_ERROR_PREVIEW_CHARS).collect();
    }

    format!("Image edit failed with status {}", status)
}
