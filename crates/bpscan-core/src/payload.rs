//! Image payload checks performed before any provider call.

use base64::{engine::general_purpose::STANDARD, Engine};
use image::ImageFormat;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::error::ImageError;

lazy_static! {
    static ref BASE64_BODY: Regex = Regex::new(r"^[A-Za-z0-9+/]*={0,2}$").unwrap();
    static ref DATA_URL_PREFIX: Regex = Regex::new(r"^data:[a-z]+/[a-z0-9.+\-]+;base64,").unwrap();
}

/// A validated image ready to be sent to a vision provider.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    mime_type: &'static str,
}

impl ImagePayload {
    /// Validate raw image bytes.
    pub fn from_bytes(bytes: Vec<u8>, max_kb: usize) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Missing);
        }

        let size_kb = size_kb(bytes.len());
        if size_kb > max_kb {
            return Err(ImageError::TooLarge { size_kb, max_kb });
        }

        let format = image::guess_format(&bytes)
            .map_err(|_| ImageError::UnsupportedFormat("unrecognized data".to_string()))?;
        let mime_type = mime_for(format)?;

        debug!("Image payload: {} KB, {}", size_kb, mime_type);
        Ok(Self { bytes, mime_type })
    }

    /// Decode and validate a base64 payload, optionally given as a data URL.
    pub fn from_base64(payload: &str, max_kb: usize) -> Result<Self, ImageError> {
        let payload = payload.trim();
        let body = DATA_URL_PREFIX
            .find(payload)
            .map(|m| &payload[m.end()..])
            .unwrap_or(payload);

        if body.is_empty() {
            return Err(ImageError::Missing);
        }
        if !BASE64_BODY.is_match(body) {
            return Err(ImageError::InvalidBase64);
        }

        let bytes = STANDARD.decode(body).map_err(|_| ImageError::InvalidBase64)?;
        Self::from_bytes(bytes, max_kb)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    /// Size in KB, rounded.
    pub fn size_kb(&self) -> usize {
        size_kb(self.bytes.len())
    }

    /// Base64 encoding of the image bytes.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// `data:` URL for providers that take one.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

fn size_kb(len: usize) -> usize {
    (len + 512) / 1024
}

fn mime_for(format: ImageFormat) -> Result<&'static str, ImageError> {
    match format {
        ImageFormat::Jpeg => Ok("image/jpeg"),
        ImageFormat::Png => Ok("image/png"),
        ImageFormat::WebP => Ok("image/webp"),
        ImageFormat::Gif => Ok("image/gif"),
        ImageFormat::Bmp => Ok("image/bmp"),
        other => Err(ImageError::UnsupportedFormat(format!("{:?}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 8-byte PNG signature followed by an IHDR chunk header.
    const PNG_HEADER: &[u8] = &[
        0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13, b'I', b'H', b'D', b'R',
    ];

    #[test]
    fn test_png_bytes() {
        let payload = ImagePayload::from_bytes(PNG_HEADER.to_vec(), 1024).unwrap();
        assert_eq!(payload.mime_type(), "image/png");
        assert!(payload.to_data_url().starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn test_base64_roundtrip_and_data_url() {
        let encoded = STANDARD.encode(PNG_HEADER);
        let plain = ImagePayload::from_base64(&encoded, 1024).unwrap();
        let url = ImagePayload::from_base64(&format!("data:image/png;base64,{}", encoded), 1024)
            .unwrap();
        assert_eq!(plain.bytes(), url.bytes());
    }

    #[test]
    fn test_invalid_base64() {
        assert!(matches!(
            ImagePayload::from_base64("not base64!", 1024),
            Err(ImageError::InvalidBase64)
        ));
        assert!(matches!(
            ImagePayload::from_base64("", 1024),
            Err(ImageError::Missing)
        ));
    }

    #[test]
    fn test_unsupported_format() {
        let encoded = STANDARD.encode(b"%PDF-1.7 not an image");
        assert!(matches!(
            ImagePayload::from_base64(&encoded, 1024),
            Err(ImageError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_too_large() {
        let mut bytes = PNG_HEADER.to_vec();
        bytes.resize(3 * 1024, 0);
        assert!(matches!(
            ImagePayload::from_bytes(bytes, 2),
            Err(ImageError::TooLarge { size_kb: 3, max_kb: 2 })
        ));
    }
}
