//! HTTP application wiring (axum router + service wiring).
//!
//! This folder is structured like:
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};

use topup_auth::{AuditConfig, SingleChannelGate};
use topup_core::ChannelId;
use topup_infra::{MemoryStore, Notifier, PgStore, Store, TopupService, TracingNotifier};

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the router around already-constructed collaborators. Used directly
/// by tests to run against the in-memory store with a fake notifier.
pub fn build_app_with(
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    admin_channel: ChannelId,
) -> Router {
    let gate = Arc::new(SingleChannelGate::new(AuditConfig { admin_channel }));
    let service = Arc::new(TopupService::new(store, gate, notifier, admin_channel));

    routes::router().layer(Extension(service))
}

/// Build the full HTTP router from configuration (entrypoint for `main.rs`).
pub async fn build_app(config: &crate::config::ApiConfig) -> anyhow::Result<Router> {
    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(8)
                .connect(url)
                .await?;
            let store = PgStore::new(pool);
            store.ensure_schema().await?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; falling back to the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    Ok(build_app_with(
        store,
        Arc::new(TracingNotifier),
        config.admin_channel,
    ))
}
