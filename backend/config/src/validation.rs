//! Config validation: semantic checks with field paths and messages.

use textgate_core::ImageKind;
use thiserror::Error;

use crate::schema::TextGateConfig;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &TextGateConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_recognition(config, &mut report);
    validate_payload(config, &mut report);
    validate_engine(config, &mut report);
    report
}

fn validate_server(config: &TextGateConfig, report: &mut ValidationReport) {
    let server = &config.server;
    if server.port != 0 && server.port < 1024 && server.port != 80 && server.port != 443 {
        report.warn(
            "server.port",
            format!(
                "Port {} requires elevated privileges; consider using a port >= 1024",
                server.port
            ),
        );
    }
    if server.bind_address.trim().is_empty() {
        report.error("server.bind_address", "bind_address cannot be empty");
    }
}

fn validate_recognition(config: &TextGateConfig, report: &mut ValidationReport) {
    let rec = &config.recognition;
    if rec.max_concurrency == 0 {
        report.error("recognition.max_concurrency", "max_concurrency must be >= 1");
    }
    if let Some(size) = rec.worker_pool_size {
        if size < rec.max_concurrency {
            report.error(
                "recognition.worker_pool_size",
                format!(
                    "worker_pool_size ({size}) is below max_concurrency ({}); admitted calls would queue for a slot",
                    rec.max_concurrency
                ),
            );
        }
    }
    if rec.recognition_timeout_seconds == 0 {
        report.error(
            "recognition.recognition_timeout_seconds",
            "recognition_timeout_seconds must be >= 1",
        );
    }
}

fn validate_payload(config: &TextGateConfig, report: &mut ValidationReport) {
    let validation = &config.validation;
    if validation.max_payload_bytes == 0 {
        report.error("validation.max_payload_bytes", "max_payload_bytes must be > 0");
    }
    if validation.allowed_formats.is_empty() {
        report.error("validation.allowed_formats", "At least one image format must be allowed");
    }
    for (i, name) in validation.allowed_formats.iter().enumerate() {
        if ImageKind::from_name(name).is_none() {
            let known: Vec<&str> = ImageKind::KNOWN.iter().map(ImageKind::name).collect();
            report.error(
                format!("validation.allowed_formats[{i}]"),
                format!("Unknown image format '{name}'. Use one of: {}", known.join(", ")),
            );
        }
    }

    let body = config.server.max_body_bytes;
    let payload = validation.max_payload_bytes;
    if body < payload {
        report.error(
            "server.max_body_bytes",
            format!("max_body_bytes ({body}) is below max_payload_bytes ({payload})"),
        );
    } else if body < payload / 3 * 4 {
        report.warn(
            "server.max_body_bytes",
            "max_body_bytes leaves no room for base64 inflation; large images will be rejected with 413",
        );
    }
}

fn validate_engine(config: &TextGateConfig, report: &mut ValidationReport) {
    let engine = &config.engine;
    if engine.tesseract_bin.trim().is_empty() {
        report.error("engine.tesseract_bin", "tesseract_bin cannot be empty");
    }
    if engine.language.trim().is_empty() {
        report.error("engine.language", "language cannot be empty");
    }
    if engine.page_segmentation_mode > 13 {
        report.error(
            "engine.page_segmentation_mode",
            format!(
                "Unknown page segmentation mode {}; tesseract accepts 0-13",
                engine.page_segmentation_mode
            ),
        );
    }
}
