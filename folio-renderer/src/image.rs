//! Image probing for embedded assets.
//!
//! Image items resolve to data URIs or URLs. Data URIs are parsed here and,
//! with the `images` feature, decoded to check they hold a usable image and
//! to learn its intrinsic size. Anything that fails becomes a placeholder.

use base64::Engine;

use crate::error::{RenderError, RenderResult};

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// GIF.
    Gif,
    /// WebP (alpha support).
    WebP,
    /// SVG; passed through without decoding.
    Svg,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.to_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/gif" => Self::Gif,
            "image/webp" => Self::WebP,
            "image/svg+xml" => Self::Svg,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }
        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }
        Self::Unknown
    }
}

/// A parsed `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// Declared MIME type (empty if none).
    pub mime: String,
    /// Decoded payload.
    pub bytes: Vec<u8>,
}

/// What probing an embedded image found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ImageInfo {
    /// Detected format.
    pub format: ImageFormat,
    /// Intrinsic size in pixels, when it was decoded.
    pub dimensions: Option<(u32, u32)>,
}

/// Parse a data URI such as `data:image/png;base64,iVBORw0KGgo...`.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the URI is malformed.
pub fn parse_data_uri(uri: &str) -> RenderResult<DataUri> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;
    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    let mut parts = metadata.split(';');
    let mime = parts.next().unwrap_or_default().to_string();
    let is_base64 = parts.any(|p| p.eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))?
    } else {
        percent_decode(payload)?
    };
    Ok(DataUri { mime, bytes })
}

/// Read the format and dimensions of an embedded image.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the URI is malformed or the payload
/// is not a decodable image.
pub fn inspect_data_uri(uri: &str) -> RenderResult<ImageInfo> {
    let data = parse_data_uri(uri)?;
    let declared = ImageFormat::from_mime(&data.mime);
    if declared == ImageFormat::Svg {
        return Ok(ImageInfo {
            format: declared,
            dimensions: None,
        });
    }
    let format = match ImageFormat::from_magic_bytes(&data.bytes) {
        ImageFormat::Unknown => declared,
        detected => detected,
    };
    decode_dimensions(&data.bytes).map(|dimensions| ImageInfo { format, dimensions })
}

#[cfg(feature = "images")]
fn decode_dimensions(bytes: &[u8]) -> RenderResult<Option<(u32, u32)>> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;
    Ok(Some((img.width(), img.height())))
}

#[cfg(not(feature = "images"))]
fn decode_dimensions(bytes: &[u8]) -> RenderResult<Option<(u32, u32)>> {
    if bytes.is_empty() {
        return Err(RenderError::Resource("Empty image payload".to_string()));
    }
    Ok(None)
}

/// Percent-decoding for non-base64 data URIs.
fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = input
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1x1 PNG.
    const PIXEL: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    #[test]
    fn test_format_detection() {
        assert_eq!(ImageFormat::from_mime("IMAGE/PNG"), ImageFormat::Png);
        assert_eq!(ImageFormat::from_mime("image/svg+xml"), ImageFormat::Svg);
        assert_eq!(ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a"), ImageFormat::Gif);
        assert_eq!(ImageFormat::from_magic_bytes(&[0, 1]), ImageFormat::Unknown);
    }

    #[test]
    fn test_parse_base64_uri() {
        let data = parse_data_uri(&format!("data:image/png;base64,{PIXEL}")).expect("parse");
        assert_eq!(data.mime, "image/png");
        assert_eq!(ImageFormat::from_magic_bytes(&data.bytes), ImageFormat::Png);
    }

    #[test]
    fn test_parse_percent_encoded_uri() {
        let data = parse_data_uri("data:image/svg+xml,%3Csvg%2F%3E").expect("parse");
        assert_eq!(data.bytes, b"<svg/>");
        assert!(parse_data_uri("data:text/plain,%zz").is_err());
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(parse_data_uri("not a data uri").is_err());
        assert!(parse_data_uri("data:image/png").is_err());
        assert!(parse_data_uri("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn test_svg_is_not_decoded() {
        let info = inspect_data_uri("data:image/svg+xml,%3Csvg%2F%3E").expect("svg");
        assert_eq!(info.format, ImageFormat::Svg);
        assert_eq!(info.dimensions, None);
    }

    #[cfg(feature = "images")]
    #[test]
    fn test_inspect_decodes_dimensions() {
        let info = inspect_data_uri(&format!("data:image/png;base64,{PIXEL}")).expect("inspect");
        assert_eq!(info.format, ImageFormat::Png);
        assert_eq!(info.dimensions, Some((1, 1)));
    }

    #[cfg(feature = "images")]
    #[test]
    fn test_inspect_rejects_garbage() {
        assert!(inspect_data_uri("data:image/png;base64,AAAA").is_err());
    }
}
