use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use sha2::{Digest, Sha256};
use thiserror::Error;

const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmbeddedImageError {
    #[error("Malformed data URI: {0}")]
    MalformedDataUri(String),

    #[error("Unsupported image encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Invalid base64 image data: {0}")]
    InvalidBase64(String),

    #[error("Embedded image is empty")]
    Empty,
}

/// Image captured offline and carried inside a queued payload until it can be
/// uploaded to object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    content_type: String,
    bytes: Bytes,
}

impl EmbeddedImage {
    /// Accepts either a `data:<mime>;base64,<data>` URI or bare base64 (JPEG assumed).
    pub fn parse(value: &str) -> Result<Self, EmbeddedImageError> {
        let value = value.trim();
        let (content_type, encoded) = match value.strip_prefix("data:") {
            Some(rest) => {
                let (header, data) = rest
                    .split_once(',')
                    .ok_or_else(|| EmbeddedImageError::MalformedDataUri(truncate(value)))?;
                let mime = header
                    .strip_suffix(";base64")
                    .ok_or_else(|| EmbeddedImageError::UnsupportedEncoding(header.to_string()))?;
                let mime = if mime.is_empty() {
                    DEFAULT_CONTENT_TYPE
                } else {
                    mime
                };
                (mime.to_string(), data)
            }
            None => (DEFAULT_CONTENT_TYPE.to_string(), value),
        };

        let decoded = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|err| EmbeddedImageError::InvalidBase64(err.to_string()))?;
        if decoded.is_empty() {
            return Err(EmbeddedImageError::Empty);
        }

        Ok(Self {
            content_type,
            bytes: Bytes::from(decoded),
        })
    }

    pub fn looks_embedded(value: &str) -> bool {
        value.trim_start().starts_with("data:")
    }

    pub fn from_bytes(content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/heic" => "heic",
            "image/gif" => "gif",
            _ => "jpg",
        }
    }

    /// Content digest used as the object name so a retried upload overwrites
    /// the same object.
    pub fn digest(&self) -> String {
        let hash = Sha256::digest(&self.bytes);
        hash.iter()
            .take(8)
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }

    pub fn object_name(&self) -> String {
        format!("{}.{}", self.digest(), self.extension())
    }
}

fn truncate(value: &str) -> String {
    value.chars().take(32).collect()
}
