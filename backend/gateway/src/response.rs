//! Outcome to HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use textgate_core::OutcomeEnvelope;

/// An [`OutcomeEnvelope`] ready to be returned from a handler.
pub struct OutcomeResponse(pub OutcomeEnvelope);

pub fn status_for(outcome: &OutcomeEnvelope) -> StatusCode {
    match outcome {
        OutcomeEnvelope::Success(_) => StatusCode::OK,
        OutcomeEnvelope::ValidationFailure(_) => StatusCode::BAD_REQUEST,
        OutcomeEnvelope::Overloaded => StatusCode::TOO_MANY_REQUESTS,
        OutcomeEnvelope::Timeout => StatusCode::GATEWAY_TIMEOUT,
        OutcomeEnvelope::EngineFailure(_) | OutcomeEnvelope::InternalFailure(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// `{"error": message}` with the given status.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

impl IntoResponse for OutcomeResponse {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        match self.0 {
            OutcomeEnvelope::Success(result) => (status, Json(result)).into_response(),
            OutcomeEnvelope::ValidationFailure(reason) => error_response(status, reason),
            OutcomeEnvelope::Overloaded => {
                error_response(status, "Server busy, please retry later")
            }
            OutcomeEnvelope::Timeout => error_response(status, "Recognition timed out"),
            OutcomeEnvelope::EngineFailure(reason) => {
                error_response(status, format!("OCR processing failed: {reason}"))
            }
            OutcomeEnvelope::InternalFailure(_) => error_response(status, "Internal server error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use textgate_core::RecognitionResult;

    #[test]
    fn statuses() {
        let cases = [
            (OutcomeEnvelope::Success(RecognitionResult::empty()), 200),
            (OutcomeEnvelope::ValidationFailure("x".into()), 400),
            (OutcomeEnvelope::Overloaded, 429),
            (OutcomeEnvelope::Timeout, 504),
            (OutcomeEnvelope::EngineFailure("x".into()), 500),
            (OutcomeEnvelope::InternalFailure("x".into()), 500),
        ];
        for (outcome, code) in cases {
            assert_eq!(status_for(&outcome).as_u16(), code, "{outcome:?}");
            assert_eq!(OutcomeResponse(outcome).into_response().status().as_u16(), code);
        }
    }
}
