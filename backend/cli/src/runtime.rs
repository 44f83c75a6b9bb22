//! Startup wiring shared by the `serve` and `recognize` commands.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use textgate_config::{load_and_prepare, resolve_config_path, EngineConfig, TextGateConfig};
use textgate_core::{EngineCell, RecognitionEngine};
use textgate_understanding::TesseractEngine;
use tracing::info;

/// Drive `future` on a fresh multi-threaded runtime, then shut the runtime
/// down without waiting for blocking calls that are still running.
///
/// A recognition call abandoned at its deadline keeps its blocking thread
/// until the engine returns; the process must not wait for it.
pub fn block_on_detached<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the tokio runtime")?;
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}

/// Resolve, load and validate the config, then apply command-line flags.
pub async fn load(
    explicit: Option<&Path>,
    bind: Option<String>,
    port: Option<u16>,
) -> Result<TextGateConfig> {
    let path = resolve_config_path(explicit);
    let mut config = load_and_prepare(&path)
        .await
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    if let Some(bind) = bind {
        config.server.bind_address = bind;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    Ok(config)
}

/// The engine cell for the configured tesseract install, built now when
/// `preload` is set and on first use otherwise.
pub fn build_engine(config: &EngineConfig, preload: bool) -> Result<Arc<EngineCell>> {
    let engine_config = config.clone();
    let cell = EngineCell::lazy(move || {
        let engine: Arc<dyn RecognitionEngine> = Arc::new(TesseractEngine::new(&engine_config)?);
        Ok(engine)
    });

    if preload {
        cell.preload()
            .context("Failed to initialize the recognition engine")?;
        info!("Recognition engine preloaded");
    }
    Ok(Arc::new(cell))
}
