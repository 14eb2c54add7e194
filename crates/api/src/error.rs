//! JSON error responses.
//!
//! Every error body is `{"error": CODE, "message": text}`. Server-side
//! failures are logged in full and reported without detail.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use mercato_core::ledger::LedgerError;
use mercato_shared::AppError;

fn respond(err: &AppError, code: &str) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = if err.is_client_error() {
        err.to_string()
    } else {
        "An error occurred".to_string()
    };

    (
        status,
        Json(json!({
            "error": code,
            "message": message
        })),
    )
        .into_response()
}

/// Response for an application error, using its generic code.
pub fn app_error_response(err: &AppError) -> Response {
    respond(err, err.error_code())
}

/// Response for a ledger error, keeping the ledger-specific code.
pub fn ledger_error_response(err: LedgerError) -> Response {
    let code = err.error_code();
    if err.is_validation() {
        warn!(error = %err, code, "request rejected");
    } else if err.http_status_code() >= 500 {
        error!(error = %err, code, "request failed");
    }
    respond(&AppError::from(err), code)
}
