//! Gateway Health API
//!
//! Reports the recognition capacity the process has right now.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::server::GatewayState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub max_workers: usize,
    pub available_permits: usize,
    pub busy_workers: usize,
    pub abandoned_workers: usize,
    pub engine_ready: bool,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

/// Handler for `GET /health`
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthReport> {
    let gateway = &state.gateway;
    Json(HealthReport {
        status: "ok",
        service: "textgate",
        max_workers: gateway.admission().capacity(),
        available_permits: gateway.admission().available(),
        busy_workers: gateway.pool().busy(),
        abandoned_workers: gateway.pool().abandoned(),
        engine_ready: gateway.engine().is_initialized(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now(),
    })
}
