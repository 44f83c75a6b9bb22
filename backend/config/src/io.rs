//! Config file discovery and loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info};

use crate::schema::TextGateConfig;

/// Default config file name in the working directory.
const LOCAL_CONFIG_FILE: &str = "textgate.yaml";

/// Resolve which config file to load.
/// Priority: explicit path > `TEXTGATE_CONFIG` env > `./textgate.yaml` > `~/.textgate/config.yaml`.
///
/// The returned path may not exist; [`load_config`] treats that as "use defaults".
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("TEXTGATE_CONFIG") {
        return PathBuf::from(path);
    }
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return local;
    }
    match dirs::home_dir() {
        Some(home) => home.join(".textgate").join("config.yaml"),
        None => local,
    }
}

/// Load and parse the config from disk.
///
/// Returns `Ok(Default::default())` if the file doesn't exist.
pub async fn load_config(path: &Path) -> Result<TextGateConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(TextGateConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Parse config YAML. An empty document yields defaults.
pub fn parse_config(raw: &str) -> Result<TextGateConfig> {
    if raw.trim().is_empty() {
        return Ok(TextGateConfig::default());
    }
    Ok(serde_yaml::from_str(raw)?)
}
