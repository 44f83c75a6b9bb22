//! Request outcome events.
//!
//! One structured line per request, at a level chosen by the outcome.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use textgate_core::OutcomeEnvelope;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct OutcomeEvent {
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub outcome: &'static str,
    pub payload_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<usize>,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl OutcomeEvent {
    pub fn new(
        request_id: Uuid,
        payload_bytes: usize,
        outcome: &OutcomeEnvelope,
        elapsed: Duration,
    ) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
            outcome: outcome.kind(),
            payload_bytes,
            lines: outcome.result().map(|r| r.line_count()),
            elapsed_ms: elapsed.as_millis() as u64,
            reason: outcome.reason().map(str::to_string),
        }
    }
}

/// Log how a request ended.
///
/// Success is `info`; client-side and capacity rejections are `warn`;
/// timeouts and engine/internal failures are `error`.
pub fn log_outcome(
    request_id: Uuid,
    payload_bytes: usize,
    outcome: &OutcomeEnvelope,
    elapsed: Duration,
) -> OutcomeEvent {
    let event = OutcomeEvent::new(request_id, payload_bytes, outcome, elapsed);
    let reason = event.reason.as_deref().unwrap_or("");

    match outcome {
        OutcomeEnvelope::Success(_) => info!(
            target: "request_events",
            request_id = %event.request_id,
            outcome = event.outcome,
            payload_kb = %format!("{:.1}", payload_bytes as f64 / 1024.0),
            lines = event.lines.unwrap_or(0),
            elapsed_ms = event.elapsed_ms,
            "Recognition succeeded"
        ),
        OutcomeEnvelope::ValidationFailure(_) | OutcomeEnvelope::Overloaded => warn!(
            target: "request_events",
            request_id = %event.request_id,
            outcome = event.outcome,
            payload_bytes,
            reason,
            "Request rejected"
        ),
        OutcomeEnvelope::Timeout
        | OutcomeEnvelope::EngineFailure(_)
        | OutcomeEnvelope::InternalFailure(_) => error!(
            target: "request_events",
            request_id = %event.request_id,
            outcome = event.outcome,
            payload_bytes,
            elapsed_ms = event.elapsed_ms,
            reason,
            "Recognition failed"
        ),
    }

    event
}
