//! `textgate-config`: runtime configuration for the textgate service.
//!
//! Provides:
//! - Typed config schema (server, recognition limits, validation, engine, logging)
//! - YAML loading with config file discovery
//! - `${ENV_VAR}` substitution and `TEXTGATE_*` overrides
//! - Default value application
//! - Semantic validation

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

// Re-export most-used types at crate root.
pub use defaults::apply_all_defaults;
pub use env::{apply_env_overrides, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{load_config, parse_config, resolve_config_path};
pub use schema::{
    EngineConfig, LoggingConfig, RecognitionConfig, ServerConfig, TextGateConfig,
    ValidationConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Load, apply env substitution and overrides, apply defaults, and validate
/// a config file.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(path: &Path) -> Result<TextGateConfig> {
    let raw_config = load_config(path).await?;
    prepare(raw_config, &std::env::vars().collect())
}

/// The env-dependent half of [`load_and_prepare`], with an explicit env map.
pub fn prepare(config: TextGateConfig, env: &HashMap<String, String>) -> Result<TextGateConfig> {
    let value = serde_json::to_value(&config).context("Failed to serialize config for processing")?;
    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;
    let config: TextGateConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_env_overrides(config, env)?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if !report.is_valid() {
        for error in &report.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
        let messages: Vec<String> = report.errors.iter().map(|e| e.to_string()).collect();
        bail!("Invalid configuration:\n  {}", messages.join("\n  "));
    }

    Ok(config)
}
