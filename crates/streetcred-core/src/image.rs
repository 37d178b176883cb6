//! # Report Images
//!
//! Images arrive base64-encoded in the submit body, optionally wrapped in a
//! `data:` URL. They are stored under `{user_id}/{YYYYMMDD_HHMMSS}_{8 hex}.{ext}`
//! with content type `image/{ext}`.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::identity::UserId;

/// Extension used when a submission does not name one.
pub const DEFAULT_IMAGE_EXTENSION: &str = "jpg";

// Clients disagree on padding; accept both.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A lowercase alphanumeric file extension of 1 to 5 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageExtension(String);

impl ImageExtension {
    pub fn new(raw: &str) -> Result<Self, ValidationError> {
        let ext = raw.trim().trim_start_matches('.');
        if ext.is_empty() || ext.len() > 5 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::InvalidImageExtension(raw.to_string()));
        }
        Ok(Self(ext.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `image/{ext}`, verbatim.
    pub fn content_type(&self) -> String {
        format!("image/{}", self.0)
    }
}

impl Default for ImageExtension {
    fn default() -> Self {
        Self(DEFAULT_IMAGE_EXTENSION.to_string())
    }
}

/// Decoded image bytes plus their extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    extension: ImageExtension,
}

impl ImagePayload {
    /// Decode base64 text, with or without a `data:...;base64,` prefix.
    pub fn from_base64(data: &str, extension: ImageExtension) -> Result<Self, ValidationError> {
        let body = data.split_once("base64,").map_or(data, |(_, rest)| rest);
        let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = LENIENT
            .decode(compact.as_bytes())
            .map_err(|e| ValidationError::InvalidImageEncoding(e.to_string()))?;
        Self::from_bytes(bytes, extension)
    }

    /// Wrap raw bytes.
    pub fn from_bytes(bytes: Vec<u8>, extension: ImageExtension) -> Result<Self, ValidationError> {
        if bytes.is_empty() {
            return Err(ValidationError::EmptyImage);
        }
        Ok(Self { bytes, extension })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn extension(&self) -> &ImageExtension {
        &self.extension
    }

    pub fn content_type(&self) -> String {
        self.extension.content_type()
    }

    /// Object key for this image.
    pub fn object_path(&self, user_id: &UserId, now: DateTime<Utc>, id: Uuid) -> String {
        let simple = id.simple().to_string();
        format!(
            "{}/{}_{}.{}",
            user_id,
            now.format("%Y%m%d_%H%M%S"),
            &simple[..8],
            self.extension.as_str()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn png() -> ImageExtension {
        ImageExtension::new("png").unwrap()
    }

    #[test]
    fn strips_data_url_prefix() {
        let payload = ImagePayload::from_base64("data:image/png;base64,aGVsbG8=", png()).unwrap();
        assert_eq!(payload.bytes(), b"hello");
    }

    #[test]
    fn accepts_missing_padding_and_line_breaks() {
        let payload = ImagePayload::from_base64("aGVs\nbG8", png()).unwrap();
        assert_eq!(payload.bytes(), b"hello");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            ImagePayload::from_base64("!!not base64!!", png()),
            Err(ValidationError::InvalidImageEncoding(_))
        ));
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(
            ImagePayload::from_base64("data:image/png;base64,", png()),
            Err(ValidationError::EmptyImage)
        );
    }

    #[test]
    fn extension_rules() {
        assert_eq!(ImageExtension::new("JPG").unwrap().as_str(), "jpg");
        assert_eq!(ImageExtension::new(".webp").unwrap().as_str(), "webp");
        assert!(ImageExtension::new("").is_err());
        assert!(ImageExtension::new("toolong").is_err());
        assert!(ImageExtension::new("p/ng").is_err());
        assert_eq!(ImageExtension::default().content_type(), "image/jpg");
    }

    #[test]
    fn object_path_layout() {
        let payload = ImagePayload::from_bytes(vec![1, 2, 3], png()).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        let id = Uuid::parse_str("a1b2c3d4-e5f6-4711-8899-aabbccddeeff").unwrap();
        let path = payload.object_path(&UserId::new("user-1").unwrap(), now, id);
        assert_eq!(path, "user-1/20250309_140507_a1b2c3d4.png");
        assert_eq!(payload.content_type(), "image/png");
    }
}
