//! Decoding of `data:` URLs carrying the backend's annotated images.

use base64::{engine::general_purpose::STANDARD, Engine};

use super::client::DetectionError;

/// Decode a base64 `data:<mime>;base64,<payload>` URL into raw bytes.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, DetectionError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| DetectionError::InvalidDataUrl("missing data: prefix".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| DetectionError::InvalidDataUrl("missing payload separator".to_string()))?;
    if !meta.ends_with(";base64") {
        return Err(DetectionError::InvalidDataUrl(format!(
            "unsupported encoding: {}",
            meta
        )));
    }

    STANDARD
        .decode(payload.trim())
        .map_err(|e| DetectionError::InvalidDataUrl(e.to_string()))
}

/// Decode a PNG data URL, checking the PNG signature.
pub fn decode_png_data_url(url: &str) -> Result<Vec<u8>, DetectionError> {
    let bytes = decode_data_url(url)?;
    if bytes.len() < 8 || &bytes[0..8] != b"\x89PNG\r\n\x1a\n" {
        return Err(DetectionError::InvalidDataUrl(
            "payload is not a PNG image".to_string(),
        ));
    }
    Ok(bytes)
}

/// Encode bytes as a PNG data URL.
pub fn encode_png_data_url(bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}
