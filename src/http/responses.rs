//! JSON error envelopes shared by the serving layer.
//!
//! Every error response carries a machine-readable body of the form
//! `{"error": <message>}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

/// Build an error response with the standard envelope.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// 429 rejection for a client that has exceeded its rate limit.
pub fn rate_limit_exceeded() -> Response {
    error_response(StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded")
}

/// 500 response for conditions the server cannot resolve per-request.
pub fn server_error() -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "the server encountered a problem and could not process your request",
    )
}
