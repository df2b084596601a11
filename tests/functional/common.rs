//! Shared helpers for functional tests

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request},
    response::Response,
    Router,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use room_edit_gateway::{api, config::Settings, AppState};
use serde_json::{json, Value};
use std::io::Cursor;
use std::sync::Arc;

const BOUNDARY: &str = "----room-edit-test-boundary";

/// Hand-built multipart/form-data body
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Request::builder()
            .method("POST")
            .uri("/api/edit")
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(self.body))
            .unwrap()
    }
}

pub fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, format).unwrap();
    out.into_inner()
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([180, 170, 160]))),
        ImageFormat::Jpeg,
    )
}

pub fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color))),
        ImageFormat::Png,
    )
}

/// Chat completion body carrying one image in `message.images`
pub fn completion_with_image(png: &[u8]) -> Value {
    json!({
        "id": "gen-1",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": "Here is the updated room.",
                "images": [{
                    "type": "image_url",
                    "image_url": {
                        "url": room_edit_gateway::response::base64::create_data_url(png, "image/png")
                    }
                }]
            }
        }]
    })
}

/// Settings pointing the generation client at a mock server
pub fn test_settings(generation_uri: &str) -> Settings {
    let mut settings = Settings::default();
    settings.generation.endpoint = format!("{}/chat/completions", generation_uri);
    settings.generation.api_key = Some("test-key".to_string());
    settings
}

pub fn app(settings: Settings) -> Router {
    let state = Arc::new(AppState::from_settings(settings).unwrap());
    api::routes::create_router(state)
}

pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
