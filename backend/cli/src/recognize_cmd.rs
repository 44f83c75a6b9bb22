//! `textgate recognize <FILE>`
//!
//! Runs one image through an in-process gateway, with the same limits and
//! validation as the server, and prints the outcome as JSON.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use textgate_config::TextGateConfig;
use textgate_core::{EngineCell, OutcomeEnvelope};
use textgate_gateway::Gateway;

use crate::runtime;
use crate::terminal_output::note_warn;

pub async fn run(config: TextGateConfig, file: &Path) -> Result<bool> {
    let image = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let engine = runtime::build_engine(&config.engine, config.recognition.preload_engine)?;
    let outcome = recognize_image(&config, engine, image).await;

    println!("{}", serde_json::to_string_pretty(&outcome_json(&outcome))?);
    if !outcome.is_success() {
        note_warn(&format!("{} ended with outcome '{}'", file.display(), outcome.kind()));
    }
    Ok(outcome.is_success())
}

async fn recognize_image(
    config: &TextGateConfig,
    engine: Arc<EngineCell>,
    image: Vec<u8>,
) -> OutcomeEnvelope {
    let gateway = Gateway::from_config(config, engine);
    let outcome = gateway.handle_request(image).await;
    gateway.shutdown();
    outcome
}

fn outcome_json(outcome: &OutcomeEnvelope) -> Value {
    match outcome {
        OutcomeEnvelope::Success(result) => json!({
            "outcome": outcome.kind(),
            "result": result,
        }),
        other => json!({
            "outcome": other.kind(),
            "error": other.reason().unwrap_or(other.kind()),
        }),
    }
}
