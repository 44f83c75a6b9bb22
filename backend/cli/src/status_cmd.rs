//! CLI Status Command
//!
//! Queries a running server's `/health` endpoint.

use anyhow::{Context, Result};
use serde_json::Value;

use crate::terminal_output::{note_error, note_success, paint, render_pairs, DIM};

pub async fn run(host: &str, port: u16, json: bool) -> Result<bool> {
    let url = format!("http://{host}:{port}/health");
    let resp = match reqwest::Client::new().get(&url).send().await {
        Ok(resp) => resp,
        Err(_) => {
            note_error(&format!("textgate is not running on {host}:{port}"));
            return Ok(false);
        }
    };

    let body: Value = resp
        .json()
        .await
        .with_context(|| format!("Unexpected response from {url}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(true);
    }

    note_success(&format!("textgate is running on {host}:{port}"));
    print!("{}", render_pairs(&health_rows(&body)));
    Ok(true)
}

fn health_rows(body: &Value) -> Vec<(String, String)> {
    const FIELDS: [&str; 7] = [
        "status",
        "max_workers",
        "available_permits",
        "busy_workers",
        "abandoned_workers",
        "engine_ready",
        "uptime_seconds",
    ];
    FIELDS
        .iter()
        .filter_map(|field| {
            body.get(*field).map(|value| {
                let shown = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (paint(DIM, field), shown)
            })
        })
        .collect()
}
