//! Environment variable handling for config values.
//!
//! Two mechanisms:
//! - `${VAR_NAME}` references inside YAML string values, resolved at load
//!   time. Only uppercase `[A-Z_][A-Z0-9_]*` names match; `$${VAR}` escapes
//!   to a literal `${VAR}`.
//! - `TEXTGATE_*` variables that override individual settings.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::schema::TextGateConfig;

/// Matches an escaped reference (group 1) or a real reference (group 2).
static ENV_VAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\$\{([A-Z_][A-Z0-9_]*)\}|\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid regex")
});

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references in a config value tree from the process env.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute env vars using a provided map (useful for testing).
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => {
            let items: Result<Vec<_>> = arr
                .iter()
                .enumerate()
                .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
                .collect();
            Ok(Value::Array(items?))
        }
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &regex::Captures| {
        if let Some(escaped) = caps.get(1) {
            return format!("${{{}}}", escaped.as_str());
        }
        let var_name = &caps[2];
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: var_name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    match missing {
        Some(err) => Err(err.into()),
        None => Ok(substituted.into_owned()),
    }
}

/// Apply `TEXTGATE_*` overrides on top of a loaded config.
pub fn apply_env_overrides(
    mut config: TextGateConfig,
    env: &HashMap<String, String>,
) -> Result<TextGateConfig> {
    if let Some(bind) = env.get("TEXTGATE_BIND") {
        config.server.bind_address = bind.clone();
    }
    if let Some(port) = parse_var(env, "TEXTGATE_PORT")? {
        config.server.port = port;
    }
    if let Some(max) = parse_var(env, "TEXTGATE_MAX_CONCURRENCY")? {
        config.recognition.max_concurrency = max;
    }
    if let Some(size) = parse_var(env, "TEXTGATE_WORKER_POOL_SIZE")? {
        config.recognition.worker_pool_size = Some(size);
    }
    if let Some(secs) = parse_var(env, "TEXTGATE_RECOGNITION_TIMEOUT")? {
        config.recognition.recognition_timeout_seconds = secs;
    }
    if let Some(bytes) = parse_var(env, "TEXTGATE_MAX_PAYLOAD_BYTES")? {
        config.validation.max_payload_bytes = bytes;
    }
    if let Some(formats) = env.get("TEXTGATE_ALLOWED_FORMATS") {
        config.validation.allowed_formats = formats
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(bin) = env.get("TEXTGATE_TESSERACT_BIN") {
        config.engine.tesseract_bin = bin.clone();
    }
    if let Some(lang) = env.get("TEXTGATE_LANGUAGE") {
        config.engine.language = lang.clone();
    }
    if let Some(dir) = env.get("TEXTGATE_LOG_DIR") {
        config.logging.dir = PathBuf::from(dir);
    }
    Ok(config)
}

fn parse_var<T: FromStr>(env: &HashMap<String, String>, name: &str) -> Result<Option<T>> {
    match env.get(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("Invalid value for {name}: {raw:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_nested_strings() {
        let value = json!({ "engine": { "tesseract_bin": "${TESS_HOME}/bin/tesseract" } });
        let out = resolve_env_vars_with(&value, &env(&[("TESS_HOME", "/opt/tess")])).unwrap();
        assert_eq!(out["engine"]["tesseract_bin"], "/opt/tess/bin/tesseract");
    }

    #[test]
    fn missing_var_reports_path() {
        let value = json!({ "logging": { "dir": "${LOG_ROOT}" } });
        let err = resolve_env_vars_with(&value, &HashMap::new()).unwrap_err();
        let err = err.downcast::<MissingEnvVarError>().unwrap();
        assert_eq!(err.var_name, "LOG_ROOT");
        assert_eq!(err.config_path, "logging.dir");
    }

    #[test]
    fn escaped_reference_is_literal() {
        let value = json!("keep $${HOME} as is");
        let out = resolve_env_vars_with(&value, &HashMap::new()).unwrap();
        assert_eq!(out, json!("keep ${HOME} as is"));
    }

    #[test]
    fn non_string_leaves_pass_through() {
        let value = json!({ "recognition": { "max_concurrency": 4, "preload_engine": true } });
        let out = resolve_env_vars_with(&value, &HashMap::new()).unwrap();
        assert_eq!(out, value);
    }

    #[test]
    fn overrides_apply() {
        let cfg = apply_env_overrides(
            TextGateConfig::default(),
            &env(&[
                ("TEXTGATE_PORT", "8088"),
                ("TEXTGATE_MAX_CONCURRENCY", "2"),
                ("TEXTGATE_ALLOWED_FORMATS", "png, jpg"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.server.port, 8088);
        assert_eq!(cfg.recognition.max_concurrency, 2);
        assert_eq!(cfg.validation.allowed_formats, vec!["png", "jpg"]);
    }

    #[test]
    fn bad_override_is_an_error() {
        let err = apply_env_overrides(
            TextGateConfig::default(),
            &env(&[("TEXTGATE_RECOGNITION_TIMEOUT", "soon")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("TEXTGATE_RECOGNITION_TIMEOUT"));
    }
}
