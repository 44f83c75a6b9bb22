//! Main HTTP Gateway Server.
//!
//! Routing, shared state and the listener loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use textgate_config::ServerConfig;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::control_ui;
use crate::gateway::Gateway;
use crate::health_api;
use crate::ocr_api;

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub gateway: Arc<Gateway>,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            started_at: Instant::now(),
        }
    }
}

pub fn build_router(state: GatewayState, config: &ServerConfig) -> Router {
    let mut app = Router::new()
        .route("/api/ocr", post(ocr_api::recognize))
        .route("/health", get(health_api::get_health))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(state);

    if let Some(dir) = &config.static_dir {
        info!(dir = %dir.display(), "Serving static UI");
        app = app.fallback_service(control_ui::static_service(dir));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Serve `router` on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
}

/// Bind the configured address and run the HTTP API until `shutdown`
/// resolves.
#[instrument(skip_all, fields(addr = %config.socket_addr()))]
pub async fn start_server<F>(config: &ServerConfig, state: GatewayState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.socket_addr();
    let router = build_router(state, config);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("textgate HTTP server listening on {}", listener.local_addr()?);
    serve(listener, router, shutdown).await
}
