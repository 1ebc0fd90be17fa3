//! Image ingestion for additional content pages
//!
//! Files are read asynchronously, identified by magic bytes and stored as
//! base64 data URIs. A file that is not a supported image fails on its own;
//! the rest of a batch carries on.

use crate::error::ImageError;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use board_model::UploadedImage;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Supported image encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG
    Png,
    /// JPEG
    Jpeg,
    /// GIF
    Gif,
    /// WebP
    Webp,
}

impl ImageFormat {
    /// MIME type
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }

    fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }
}

/// Identify an image by its leading bytes
#[must_use]
pub fn sniff(bytes: &[u8]) -> Option<ImageFormat> {
    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";
    if bytes.starts_with(PNG) {
        Some(ImageFormat::Png)
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(ImageFormat::Jpeg)
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some(ImageFormat::Gif)
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some(ImageFormat::Webp)
    } else {
        None
    }
}

/// Encode image bytes as a data URI
///
/// # Errors
/// `ImageError::DecodeFailed` if the bytes are not a supported image.
pub fn encode_data_uri(name: &str, bytes: &[u8]) -> Result<String, ImageError> {
    let format = sniff(bytes).ok_or_else(|| ImageError::decode(name, "not a PNG, JPEG, GIF or WebP image"))?;
    Ok(format!("data:{};base64,{}", format.mime(), B64.encode(bytes)))
}

/// Split a base64 data URI back into format and bytes
///
/// # Errors
/// `ImageError::DecodeFailed` for anything but a base64 image data URI.
pub fn decode_data_uri(uri: &str) -> Result<(ImageFormat, Vec<u8>), ImageError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| ImageError::decode("data URI", "missing `data:` scheme"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageError::decode("data URI", "missing payload"))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| ImageError::decode("data URI", "payload is not base64"))?;
    let format = ImageFormat::from_mime(mime)
        .ok_or_else(|| ImageError::decode("data URI", format!("unsupported type {mime}")))?;
    let bytes = B64
        .decode(payload)
        .map_err(|e| ImageError::decode("data URI", e))?;
    Ok((format, bytes))
}

/// Build an uploaded image from raw bytes
///
/// # Errors
/// `ImageError::DecodeFailed` if the bytes are not a supported image.
pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<UploadedImage, ImageError> {
    let name = name.into();
    let src = encode_data_uri(&name, bytes)?;
    Ok(UploadedImage {
        id: Uuid::new_v4().to_string(),
        src,
        name,
    })
}

/// File name for a pasted screenshot, `screenshot-YYYY-MM-DDTHH-MM-SS.png`
#[must_use]
pub fn screenshot_name(now: DateTime<Utc>) -> String {
    format!("screenshot-{}.png", now.format("%Y-%m-%dT%H-%M-%S"))
}

/// Build an uploaded image from pasted clipboard bytes
///
/// # Errors
/// `ImageError::DecodeFailed` if the clipboard did not hold an image.
pub fn from_clipboard(bytes: &[u8], now: DateTime<Utc>) -> Result<UploadedImage, ImageError> {
    from_bytes(screenshot_name(now), bytes)
}

/// Read one image file
///
/// # Errors
/// `ImageError::DecodeFailed` if the file is unreadable or not an image.
pub async fn read_image(path: &Path) -> Result<UploadedImage, ImageError> {
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ImageError::decode(&name, e))?;
    from_bytes(name, &bytes)
}

/// Result of a multi-file upload
#[derive(Debug, Default)]
pub struct ImageBatch {
    /// Decoded images, in input order
    pub images: Vec<UploadedImage>,
    /// Files that could not be decoded
    pub failures: Vec<ImageError>,
    /// Files not read because no slot was left
    pub skipped: Vec<PathBuf>,
}

/// Read up to `slots` images, skipping files that fail to decode
pub async fn load_images(paths: &[PathBuf], slots: usize) -> ImageBatch {
    let mut batch = ImageBatch::default();
    for path in paths {
        if batch.images.len() >= slots {
            batch.skipped.push(path.clone());
            continue;
        }
        match read_image(path).await {
            Ok(image) => batch.images.push(image),
            Err(e) => {
                tracing::warn!("Skipping upload: {}", e);
                batch.failures.push(e);
            }
        }
    }
    batch
}
