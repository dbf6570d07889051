use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use topup_core::CoreError;

pub fn core_error_to_response(err: CoreError) -> axum::response::Response {
    match err {
        CoreError::InvalidAmount(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_amount", msg),
        CoreError::NoActiveTicket => json_error(
            StatusCode::NOT_FOUND,
            "no_active_ticket",
            "no pending ticket to attach proof to",
        ),
        CoreError::AlreadyDecided => json_error(
            StatusCode::CONFLICT,
            "already_decided",
            "ticket was already decided",
        ),
        CoreError::Unauthorized => json_error(
            StatusCode::FORBIDDEN,
            "unauthorized",
            "actor may not decide tickets",
        ),
        CoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        CoreError::Storage(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_failure", msg)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
