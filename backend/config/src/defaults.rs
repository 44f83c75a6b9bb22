//! Config defaults: default constants and normalization of loaded values.

use textgate_core::ImageKind;

use crate::schema::TextGateConfig;

/// Default listen address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default max concurrent recognition calls.
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Default recognition deadline (seconds).
pub const DEFAULT_RECOGNITION_TIMEOUT_SECS: u64 = 60;

/// Default max decoded image size (10 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default max HTTP body (15 MiB, room for base64 + JSON framing).
pub const DEFAULT_MAX_BODY_BYTES: usize = 15 * 1024 * 1024;

/// Default image format allow-list.
pub const DEFAULT_ALLOWED_FORMATS: [&str; 3] = ["jpeg", "png", "bmp"];

pub const DEFAULT_TESSERACT_BIN: &str = "tesseract";
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Tesseract fully automatic page segmentation.
pub const DEFAULT_PAGE_SEGMENTATION_MODE: u8 = 3;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_FILE: &str = "textgate.log";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: TextGateConfig) -> TextGateConfig {
    normalize_formats(apply_pool_defaults(config))
}

/// Pin the worker pool size to the admission capacity when unset.
fn apply_pool_defaults(mut config: TextGateConfig) -> TextGateConfig {
    if config.recognition.worker_pool_size.is_none() {
        config.recognition.worker_pool_size = Some(config.recognition.max_concurrency);
    }
    config
}

/// Canonicalize format names (`jpg` → `jpeg`) and drop duplicates.
/// Unknown names are kept verbatim so validation can report them.
fn normalize_formats(mut config: TextGateConfig) -> TextGateConfig {
    let mut normalized: Vec<String> = Vec::new();
    for name in &config.validation.allowed_formats {
        let canonical = match ImageKind::from_name(name) {
            Some(kind) => kind.name().to_string(),
            None => name.trim().to_ascii_lowercase(),
        };
        if !normalized.contains(&canonical) {
            normalized.push(canonical);
        }
    }
    config.validation.allowed_formats = normalized;
    config
}
