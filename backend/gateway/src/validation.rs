//! Payload validation.
//!
//! Runs before admission so malformed input never consumes a permit. Only
//! the container header is read; pixel data is left to the engine.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};
use textgate_config::ValidationConfig;
use textgate_core::{ImageKind, RecognitionRequest};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("image payload is empty")]
    Empty,

    #[error("image size {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("invalid image file: {0}")]
    Undecodable(String),

    #[error("unsupported image format: {format}; supported formats: {allowed}")]
    UnsupportedFormat { format: String, allowed: String },
}

#[derive(Debug, Clone)]
pub struct ImageValidator {
    max_payload_bytes: usize,
    allowed: Vec<ImageKind>,
}

impl ImageValidator {
    pub fn new(max_payload_bytes: usize, allowed: Vec<ImageKind>) -> Self {
        Self {
            max_payload_bytes,
            allowed,
        }
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self::new(config.max_payload_bytes, config.allowed_kinds())
    }

    pub fn max_payload_bytes(&self) -> usize {
        self.max_payload_bytes
    }

    pub fn allowed(&self) -> &[ImageKind] {
        &self.allowed
    }

    /// Check size, container format and header, in that order.
    ///
    /// A payload of exactly `max_payload_bytes` is accepted.
    pub fn validate(&self, bytes: Vec<u8>) -> Result<RecognitionRequest, ValidationError> {
        if bytes.len() > self.max_payload_bytes {
            return Err(ValidationError::TooLarge {
                size: bytes.len(),
                limit: self.max_payload_bytes,
            });
        }
        if bytes.is_empty() {
            return Err(ValidationError::Empty);
        }

        let format = image::guess_format(&bytes)
            .map_err(|e| ValidationError::Undecodable(e.to_string()))?;
        let kind = kind_of(format);
        if !self.allowed.contains(&kind) {
            let format = match kind {
                ImageKind::Other => format!("{format:?}").to_lowercase(),
                known => known.name().to_string(),
            };
            return Err(ValidationError::UnsupportedFormat {
                format,
                allowed: self.allowed_list(),
            });
        }

        let (width, height) = ImageReader::with_format(Cursor::new(bytes.as_slice()), format)
            .into_dimensions()
            .map_err(|e| ValidationError::Undecodable(e.to_string()))?;

        debug!(kind = %kind, width, height, bytes = bytes.len(), "Payload validated");
        Ok(RecognitionRequest::new(bytes, kind, width, height))
    }

    fn allowed_list(&self) -> String {
        self.allowed
            .iter()
            .map(|k| k.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn kind_of(format: ImageFormat) -> ImageKind {
    match format {
        ImageFormat::Jpeg => ImageKind::Jpeg,
        ImageFormat::Png => ImageKind::Png,
        ImageFormat::Bmp => ImageKind::Bmp,
        ImageFormat::Gif => ImageKind::Gif,
        ImageFormat::WebP => ImageKind::Webp,
        ImageFormat::Tiff => ImageKind::Tiff,
        ImageFormat::Ico => ImageKind::Ico,
        _ => ImageKind::Other,
    }
}
