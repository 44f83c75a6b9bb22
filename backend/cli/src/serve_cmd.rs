//! `textgate serve`

use std::sync::Arc;

use anyhow::Result;
use textgate_config::TextGateConfig;
use textgate_gateway::{start_server, Gateway, GatewayState};
use tracing::{info, warn};

use crate::runtime;

pub async fn run(config: TextGateConfig) -> Result<()> {
    info!(
        bind = %config.server.bind_address,
        port = config.server.port,
        max_concurrency = config.recognition.max_concurrency,
        pool_size = config.recognition.pool_size(),
        timeout_secs = config.recognition.recognition_timeout_seconds,
        "Starting textgate"
    );

    let engine = runtime::build_engine(&config.engine, config.recognition.preload_engine)?;
    let gateway = Arc::new(Gateway::from_config(&config, engine));
    let state = GatewayState::new(Arc::clone(&gateway));

    let result = start_server(&config.server, state, shutdown_signal()).await;
    gateway.shutdown();
    result
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Cannot listen for Ctrl-C; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
