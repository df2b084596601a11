//! Base64 and data URL utilities

use base64::{engine::general_purpose::STANDARD, Engine};

/// Encode binary data to base64 string
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode a base64 string, ignoring surrounding and embedded whitespace
pub fn decode(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact)
}

/// Create a data URL from binary data
pub fn create_data_url(data: &[u8], mime_type: &str) -> String {
    format!("data:{};base64,{}", mime_type, encode(data))
}

/// Split a `data:<mime>;base64,<payload>` URL into its mime type and payload.
///
/// Returns `None` unless the URL is base64 encoded and names a mime type.
pub fn split_data_url(data_url: &str) -> Option<(&str, &str)> {
    let rest = data_url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime_type = header.strip_suffix(";base64")?.trim();
    if mime_type.is_empty() || !mime_type.contains('/') {
        return None;
    }
    Some((mime_type, payload))
}
