//! Unit tests for response helpers

use room_edit_gateway::response::{base64, EditResponse};
use room_edit_gateway::storage::{BlobDocumentation, StoredBlob};

#[test]
fn test_base64_encode_decode() {
    let original = b"Hello, World!";
    let encoded = base64::encode(original);
    let decoded = base64::decode(&encoded).unwrap();

    assert_eq!(original.as_slice(), decoded.as_slice());
}

#[test]
fn test_split_data_url() {
    let data_url = "data:image/png;base64,SGVsbG8sIFdvcmxkIQ==";
    let (mime, payload) = base64::split_data_url(data_url).unwrap();

    assert_eq!(mime, "image/png");
    assert_eq!(base64::decode(payload).unwrap(), b"Hello, World!");
}

#[test]
fn test_create_data_url() {
    let data = b"test data";
    let data_url = base64::create_data_url(data, "image/webp");

    assert!(data_url.starts_with("data:image/webp;base64,"));
}

#[test]
fn test_edit_response_with_blobs() {
    let blob = StoredBlob {
        pathname: "edits/1/output.png".to_string(),
        url: "https://blobs.test/edits/1/output.png".to_string(),
        download_url: "https://blobs.test/edits/1/output.png?download=1".to_string(),
        content_type: "image/png".to_string(),
    };
    let response = EditResponse::new(
        b"png",
        Some(BlobDocumentation {
            output: Some(blob),
            ..BlobDocumentation::default()
        }),
    );

    let value = serde_json::to_value(response).unwrap();
    assert_eq!(value["blobs"]["output"]["contentType"], "image/png");
    assert_eq!(
        value["blobs"]["output"]["downloadUrl"],
        "https://blobs.test/edits/1/output.png?download=1"
    );
    assert!(value["blobs"]["input"].is_null());
}
