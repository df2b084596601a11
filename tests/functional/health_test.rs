//! Functional tests for GET /health

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

use super::common::{app, json_body, test_settings};

#[tokio::test]
async fn test_health_reports_ok() {
    let app = app(test_settings("http://127.0.0.1:9"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["persistence"], false);
}

#[tokio::test]
async fn test_edit_requires_multipart_body() {
    let app = app(test_settings("http://127.0.0.1:9"));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/edit")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("Malformed form data"));
}
