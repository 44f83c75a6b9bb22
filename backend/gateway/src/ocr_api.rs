//! Recognition endpoint (`POST /api/ocr`).

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use tracing::warn;

use crate::response::{error_response, OutcomeResponse};
use crate::server::GatewayState;

#[derive(Debug, Deserialize)]
pub struct OcrRequest {
    pub image: Option<String>,
}

/// Handler for `POST /api/ocr`.
pub async fn recognize(
    State(state): State<GatewayState>,
    payload: Result<Json<OcrRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    let Some(encoded) = request.image else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'image' field in request");
    };
    let image = match decode_image(&encoded) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Base64 decoding failed");
            return error_response(StatusCode::BAD_REQUEST, "Base64 decoding failed");
        }
    };

    OutcomeResponse(state.gateway.handle_request(image).await).into_response()
}

fn rejection_response(rejection: JsonRejection) -> Response {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!("Request body over the size limit");
        return error_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
    }
    warn!(error = %rejection.body_text(), "Rejected malformed request body");
    error_response(
        StatusCode::BAD_REQUEST,
        format!("Invalid request body: {}", rejection.body_text()),
    )
}

/// Decode the base64 image field, stripping a `data:<mime>;base64,` prefix
/// and any embedded whitespace.
pub fn decode_image(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let body = match encoded.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    };
    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact)
}
