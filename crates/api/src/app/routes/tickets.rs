use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use topup_core::TicketId;
use topup_infra::TopupService;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/tickets/:id", get(get_ticket))
}

pub async fn get_ticket(
    Extension(service): Extension<Arc<TopupService>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match service.ticket(TicketId::new(id)).await {
        Ok(ticket) => (StatusCode::OK, Json(dto::TicketDto::from(ticket))).into_response(),
        Err(err) => errors::core_error_to_response(err),
    }
}
