use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use topup_core::ExternalId;
use topup_infra::TopupService;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/accounts/:external_id/balance", get(get_balance))
        .route("/accounts/:external_id/overview", get(get_overview))
        .route("/accounts/:external_id/ledger", get(list_ledger))
}

pub async fn get_balance(
    Extension(service): Extension<Arc<TopupService>>,
    Path(external_id): Path<i64>,
) -> axum::response::Response {
    match service.balance(ExternalId::new(external_id)).await {
        Ok(balance) => (
            StatusCode::OK,
            Json(dto::BalanceDto {
                external_id,
                balance: balance.to_decimal(),
                balance_minor: balance.minor(),
            }),
        )
            .into_response(),
        Err(err) => errors::core_error_to_response(err),
    }
}

pub async fn get_overview(
    Extension(service): Extension<Arc<TopupService>>,
    Path(external_id): Path<i64>,
) -> axum::response::Response {
    match service.account_overview(ExternalId::new(external_id)).await {
        Ok(overview) => (StatusCode::OK, Json(dto::OverviewDto::from(overview))).into_response(),
        Err(err) => errors::core_error_to_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    20
}

pub async fn list_ledger(
    Extension(service): Extension<Arc<TopupService>>,
    Path(external_id): Path<i64>,
    Query(query): Query<LedgerQuery>,
) -> axum::response::Response {
    let limit = query.limit.min(100);
    match service
        .recent_entries(ExternalId::new(external_id), limit)
        .await
    {
        Ok(entries) => {
            let items: Vec<dto::LedgerEntryDto> = entries.into_iter().map(Into::into).collect();
            (
                StatusCode::OK,
                Json(serde_json::json!({ "items": items })),
            )
                .into_response()
        }
        Err(err) => errors::core_error_to_response(err),
    }
}
