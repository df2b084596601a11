//! Response handling module - Edit response body and base64 helpers

pub mod base64;

use serde::Serialize;

use crate::storage::BlobDocumentation;

/// Successful edit response
#[derive(Debug, Clone, Serialize)]
pub struct EditResponse {
    /// Composited PNG as a data URL
    pub image: String,
    /// Archive locations, `null` when persistence is disabled
    pub blobs: Option<BlobDocumentation>,
}

impl EditResponse {
    pub fn new(png: &[u8], blobs: Option<BlobDocumentation>) -> Self {
        Self {
            image: base64::create_data_url(png, "image/png"),
            blobs,
        }
    }
}
