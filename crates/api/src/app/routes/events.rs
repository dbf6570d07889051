use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use topup_core::{Amount, TicketId};
use topup_infra::TopupService;
use topup_tickets::ProofRef;

use crate::app::dto::{self, InboundEvent};
use crate::app::errors;

pub fn router() -> Router {
    Router::new().route("/events", post(handle_event))
}

/// Single intake for transport-delivered events.
pub async fn handle_event(
    Extension(service): Extension<Arc<TopupService>>,
    Json(event): Json<InboundEvent>,
) -> axum::response::Response {
    // Every inbound event refreshes the sender's contact profile first.
    if let Err(err) = service.register_contact(event.actor().profile()).await {
        return errors::core_error_to_response(err);
    }

    match event {
        InboundEvent::CreateTicket {
            actor,
            declared_amount,
        } => {
            let amount = match Amount::parse_decimal(&declared_amount) {
                Ok(amount) => amount,
                Err(err) => return errors::core_error_to_response(err),
            };
            match service.create_ticket(actor.external(), amount).await {
                Ok(ticket) => {
                    (StatusCode::CREATED, Json(dto::TicketDto::from(ticket))).into_response()
                }
                Err(err) => errors::core_error_to_response(err),
            }
        }
        InboundEvent::AttachProof { actor, proof_ref } => {
            match service
                .attach_proof(actor.external(), ProofRef::new(proof_ref))
                .await
            {
                Ok(ticket) => (StatusCode::OK, Json(dto::TicketDto::from(ticket))).into_response(),
                Err(err) => errors::core_error_to_response(err),
            }
        }
        InboundEvent::Decide {
            actor,
            ticket_id,
            decision,
            audited_amount,
        } => {
            let override_amount = match audited_amount
                .as_deref()
                .map(Amount::parse_decimal)
                .transpose()
            {
                Ok(amount) => amount,
                Err(err) => return errors::core_error_to_response(err),
            };
            match service
                .decide(
                    TicketId::new(ticket_id),
                    decision,
                    override_amount,
                    &actor.context(),
                )
                .await
            {
                Ok(ticket) => (StatusCode::OK, Json(dto::TicketDto::from(ticket))).into_response(),
                Err(err) => errors::core_error_to_response(err),
            }
        }
    }
}
