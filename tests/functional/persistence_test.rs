//! Functional tests for best-effort artifact persistence

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::common::{app, completion_with_image, jpeg, json_body, png, test_settings, MultipartBody};

async fn generation_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion_with_image(&png(24, 24, [5, 5, 5]))),
        )
        .expect(1)
        .mount(&server)
        .await;
    server
}

fn request() -> axum::http::Request<axum::body::Body> {
    MultipartBody::new()
        .text("prompt", "add a plant in the corner")
        .file("image", "room.jpg", "image/jpeg", &jpeg(24, 24))
        .into_request()
}

#[tokio::test]
async fn test_artifacts_are_documented_when_storage_enabled() {
    let generation = generation_server().await;
    let blobs = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/edits/[0-9a-f-]{36}/(input\.jpg|output\.png|metadata\.json)$"))
        .and(header("authorization", "Bearer blob-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "https://blobs.test/artifact",
            "downloadUrl": "https://blobs.test/artifact?download=1",
            "pathname": "artifact",
            "contentType": "application/octet-stream"
        })))
        .expect(3)
        .mount(&blobs)
        .await;

    let mut settings = test_settings(&generation.uri());
    settings.storage.enabled = true;
    settings.storage.endpoint = blobs.uri();
    settings.storage.token = Some("blob-token".to_string());

    let response = app(settings).oneshot(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["blobs"]["input"]["url"], "https://blobs.test/artifact");
    assert_eq!(
        body["blobs"]["output"]["downloadUrl"],
        "https://blobs.test/artifact?download=1"
    );
    assert!(body["blobs"]["metadata"].is_object());
    assert!(body["blobs"]["mask"].is_null());
}

#[tokio::test]
async fn test_storage_failures_do_not_fail_the_edit() {
    let generation = generation_server().await;
    let blobs = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500).set_body_string("store down"))
        .mount(&blobs)
        .await;

    let mut settings = test_settings(&generation.uri());
    settings.storage.enabled = true;
    settings.storage.endpoint = blobs.uri();
    settings.storage.token = Some("blob-token".to_string());

    let response = app(settings).oneshot(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert!(body["image"].as_str().unwrap().starts_with("data:image/png;base64,"));
    for artifact in ["input", "mask", "output", "metadata"] {
        assert!(body["blobs"][artifact].is_null(), "{artifact}");
    }
}

#[tokio::test]
async fn test_storage_without_token_is_disabled() {
    let generation = generation_server().await;

    let mut settings = test_settings(&generation.uri());
    settings.storage.enabled = true;
    settings.storage.token = None;

    let response = app(settings).oneshot(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(json_body(response).await["blobs"].is_null());
}
