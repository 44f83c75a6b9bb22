//! textgate configuration schema.
//!
//! Every section is optional in the YAML file; missing fields take the
//! values from [`crate::defaults`].

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use textgate_core::ImageKind;

use crate::defaults;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for textgate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextGateConfig {
    /// HTTP listener settings
    pub server: ServerConfig,

    /// Admission and dispatch limits
    pub recognition: RecognitionConfig,

    /// Payload checks applied before admission
    pub validation: ValidationConfig,

    /// Tesseract engine settings
    pub engine: EngineConfig,

    /// Console and file logging
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Largest accepted HTTP body. Base64 inflates images by a third, so
    /// this sits above `validation.max_payload_bytes`.
    pub max_body_bytes: usize,
    /// Directory of static UI assets served at `/`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: defaults::DEFAULT_BIND_ADDRESS.to_string(),
            port: defaults::DEFAULT_PORT,
            max_body_bytes: defaults::DEFAULT_MAX_BODY_BYTES,
            static_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

// ---------------------------------------------------------------------------
// Recognition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Admission capacity: recognition calls allowed in flight at once.
    pub max_concurrency: usize,
    /// Dispatch slots. `None` means "same as max_concurrency".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_pool_size: Option<usize>,
    pub recognition_timeout_seconds: u64,
    /// Build the engine at startup instead of on the first request.
    pub preload_engine: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            max_concurrency: defaults::DEFAULT_MAX_CONCURRENCY,
            worker_pool_size: None,
            recognition_timeout_seconds: defaults::DEFAULT_RECOGNITION_TIMEOUT_SECS,
            preload_engine: false,
        }
    }
}

impl RecognitionConfig {
    pub fn pool_size(&self) -> usize {
        self.worker_pool_size.unwrap_or(self.max_concurrency)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.recognition_timeout_seconds)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub max_payload_bytes: usize,
    pub allowed_formats: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: defaults::DEFAULT_MAX_PAYLOAD_BYTES,
            allowed_formats: defaults::DEFAULT_ALLOWED_FORMATS
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }
}

impl ValidationConfig {
    /// The allow-list as image kinds. Unknown names are skipped; validation
    /// reports them as errors before this is used.
    pub fn allowed_kinds(&self) -> Vec<ImageKind> {
        let mut kinds: Vec<ImageKind> = self
            .allowed_formats
            .iter()
            .filter_map(|name| ImageKind::from_name(name))
            .collect();
        kinds.dedup();
        kinds
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path or name of the tesseract executable.
    pub tesseract_bin: String,
    /// Tesseract language pack(s), e.g. "eng" or "chi_sim+eng".
    pub language: String,
    /// Tesseract `--psm` value (0..=13).
    pub page_segmentation_mode: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tesseract_bin: defaults::DEFAULT_TESSERACT_BIN.to_string(),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            page_segmentation_mode: defaults::DEFAULT_PAGE_SEGMENTATION_MODE,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for the rolling NDJSON log file.
    pub dir: PathBuf,
    pub file_name: String,
    /// Emit JSON on the console instead of human-readable text.
    pub json_console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::DEFAULT_LOG_LEVEL.to_string(),
            dir: PathBuf::from(defaults::DEFAULT_LOG_DIR),
            file_name: defaults::DEFAULT_LOG_FILE.to_string(),
            json_console: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "recognition:\n  max_concurrency: 4\n";
        let cfg: TextGateConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.recognition.max_concurrency, 4);
        assert_eq!(cfg.recognition.pool_size(), 4);
        assert_eq!(cfg.recognition.recognition_timeout_seconds, 60);
        assert_eq!(cfg.validation.max_payload_bytes, 10 * 1024 * 1024);
        assert_eq!(cfg.server.port, defaults::DEFAULT_PORT);
    }

    #[test]
    fn allowed_kinds_maps_names() {
        let cfg = ValidationConfig::default();
        assert_eq!(
            cfg.allowed_kinds(),
            vec![ImageKind::Jpeg, ImageKind::Png, ImageKind::Bmp]
        );
    }

    #[test]
    fn explicit_pool_size_wins() {
        let cfg = RecognitionConfig {
            worker_pool_size: Some(16),
            ..Default::default()
        };
        assert_eq!(cfg.pool_size(), 16);
        assert_eq!(cfg.timeout(), Duration::from_secs(60));
    }
}
