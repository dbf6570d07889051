use axum::{Router, routing::get};

pub mod accounts;
pub mod events;
pub mod system;
pub mod tickets;

pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .merge(events::router())
        .merge(accounts::router())
        .merge(tickets::router())
}
