//! Unit tests for generation response extraction

use room_edit_gateway::backend::extract::{extract_image, ChatCompletion};
use room_edit_gateway::backend::http_backend::upstream_error_message;
use room_edit_gateway::AppError;
use serde_json::json;

fn parse(value: serde_json::Value) -> ChatCompletion {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_extracts_inline_b64_json_with_mime() {
    let completion = parse(json!({
        "choices": [{
            "message": {
                "content": [{"type": "image", "b64_json": "SGVsbG8=", "mime_type": "image/webp"}]
            }
        }]
    }));

    let image = extract_image(&completion).unwrap();
    assert_eq!(image.mime_type, "image/webp");
    assert_eq!(image.bytes, b"Hello");
}

#[test]
fn test_empty_choices_means_no_image() {
    let completion = parse(json!({"choices": []}));
    assert!(matches!(extract_image(&completion), Err(AppError::NoImageReturned)));

    let completion = parse(json!({}));
    assert!(matches!(extract_image(&completion), Err(AppError::NoImageReturned)));
}

#[test]
fn test_malformed_data_url_is_reported() {
    let completion = parse(json!({
        "choices": [{"message": {"images": [{"image_url": {"url": "data:image/png,raw"}}]}}]
    }));
    assert!(matches!(
        extract_image(&completion),
        Err(AppError::MalformedImagePayload(_))
    ));
}

#[test]
fn test_text_beside_image_part_still_yields_image() {
    let completion: ChatCompletion = serde_json::from_str(
        r#"{"choices":[{"message":{"role":"assistant","content":[
            "Here is your room",
            {"type":"image_url","image_url":{"url":"data:image/png;base64,SGVsbG8="}}
        ]}}]}"#,
    )
    .unwrap();

    let image = extract_image(&completion).unwrap();
    assert_eq!(image.mime_type, "image/png");
    assert_eq!(image.bytes, b"Hello");
}

#[test]
fn test_null_images_entry_does_not_break_parsing() {
    let completion: ChatCompletion = serde_json::from_str(
        r#"{"choices":[{"message":{"images":[null],
            "content":[{"type":"image_url","image_url":{"url":"data:image/webp;base64,SGVsbG8="}}]}}]}"#,
    )
    .unwrap();

    let image = extract_image(&completion).unwrap();
    assert_eq!(image.mime_type, "image/webp");
    assert_eq!(image.bytes, b"Hello");
}

#[test]
fn test_upstream_error_message_fallbacks() {
    assert_eq!(
        upstream_error_message(400, r#"{"error":{"message":"Invalid image"}}"#),
        "Invalid image"
    );
    assert_eq!(upstream_error_message(500, "Bad gateway upstream"), "Bad gateway upstream");
    assert_eq!(upstream_error_message(500, ""), "Image edit failed with status 500");
}
